use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers::court_lists};

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/court-lists/publish",
            post(court_lists::publish_court_list_handler),
        )
        .route(
            "/court-lists/{id}/status",
            get(court_lists::get_status_handler),
        )
        .route(
            "/court-lists/{id}/file",
            get(court_lists::download_file_handler),
        )
        .route(
            "/court-centres/{id}/court-lists",
            get(court_lists::list_court_centre_statuses_handler),
        )
        .route(
            "/court-centres/{id}/artifacts",
            get(court_lists::list_court_centre_artifacts_handler),
        )
}
