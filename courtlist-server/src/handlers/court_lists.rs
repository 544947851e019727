use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use courtlist_model::{
    ArtifactRef, CourtCentreId, CourtListId, CourtListType, NewStatusRecord,
    StatusRecord,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{errors::AppResult, infra::app_state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishCourtListRequest {
    pub court_list_id: Uuid,
    pub court_centre_id: Uuid,
    pub court_list_type: String,
    pub publish_date: NaiveDate,
}

impl PublishCourtListRequest {
    fn into_new_record(self) -> AppResult<NewStatusRecord> {
        Ok(NewStatusRecord {
            court_list_id: CourtListId(self.court_list_id),
            court_centre_id: CourtCentreId(self.court_centre_id),
            court_list_type: CourtListType::new(&self.court_list_type)?,
            publish_date: self.publish_date,
        })
    }
}

/// Accept a publish request; the pipeline runs in the background.
pub async fn publish_court_list_handler(
    State(state): State<AppState>,
    payload: Result<Json<PublishCourtListRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<StatusRecord>)> {
    let Json(request) = payload?;
    let accepted = state
        .publications
        .request_publish(request.into_new_record()?)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(accepted.record)))
}

pub async fn get_status_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<StatusRecord>> {
    let Path(id) = id?;
    let record = state.publications.get_status(CourtListId(id)).await?;
    Ok(Json(record))
}

pub async fn download_file_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id?;
    let bytes = state.publications.download_file(CourtListId(id)).await?;
    let disposition = format!("attachment; filename=\"{id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn list_court_centre_statuses_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<StatusRecord>>> {
    let Path(id) = id?;
    let records = state
        .publications
        .list_statuses_by_court_centre(CourtCentreId(id))
        .await?;
    Ok(Json(records))
}

pub async fn list_court_centre_artifacts_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<ArtifactRef>>> {
    let Path(id) = id?;
    let artifacts = state
        .publications
        .list_artifacts(CourtCentreId(id))
        .await?;
    Ok(Json(artifacts))
}
