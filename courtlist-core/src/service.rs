use courtlist_model::{
    ArtifactRef, CourtCentreId, CourtListId, NewStatusRecord, StatusRecord,
    TrackStatus,
};
use std::{fmt, sync::Arc};
use tracing::{info, instrument, warn};

use crate::{
    error::{PublicationError, Result},
    orchestration::{
        DispatchOutcome, PipelineSettings, PublishDispatcher, PublishJob,
    },
    providers::ContentStore,
    store::StatusStore,
};

/// Result of accepting a publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAccepted {
    pub record: StatusRecord,
    pub created: bool,
    pub dispatch: DispatchOutcome,
}

/// Caller-facing operations: request a publication, poll its status, and
/// read back the stored artifact.
#[derive(Clone)]
pub struct PublicationService {
    store: Arc<dyn StatusStore>,
    content_store: Arc<dyn ContentStore>,
    dispatcher: Arc<PublishDispatcher>,
    settings: PipelineSettings,
}

impl fmt::Debug for PublicationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicationService")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl PublicationService {
    pub fn new(
        store: Arc<dyn StatusStore>,
        content_store: Arc<dyn ContentStore>,
        dispatcher: Arc<PublishDispatcher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            content_store,
            dispatcher,
            settings,
        }
    }

    pub fn dispatcher(&self) -> &Arc<PublishDispatcher> {
        &self.dispatcher
    }

    /// Upserts the record and queues a pipeline run. Returns as soon as the
    /// job is queued; an enqueue failure is returned after the upsert has
    /// already taken effect.
    #[instrument(
        name = "publication.request_publish",
        skip(self, request),
        fields(
            court_list_id = %request.court_list_id,
            court_centre_id = %request.court_centre_id
        ),
        err(level = "warn")
    )]
    pub async fn request_publish(
        &self,
        request: NewStatusRecord,
    ) -> Result<PublishAccepted> {
        let outcome = self.store.upsert(request).await?;
        let id = outcome.record.court_list_id;

        let dispatch = self.dispatcher.dispatch(PublishJob::new(id)).await?;
        info!(created = outcome.created, ?dispatch, "publish request accepted");

        Ok(PublishAccepted {
            record: outcome.record,
            created: outcome.created,
            dispatch,
        })
    }

    // Unknown ids are routine for pollers; keep them out of error logs.
    #[instrument(
        name = "publication.get_status",
        skip(self),
        level = "debug",
        err(level = "debug")
    )]
    pub async fn get_status(&self, id: CourtListId) -> Result<StatusRecord> {
        self.store.get(id).await
    }

    #[instrument(
        name = "publication.list_statuses",
        skip(self),
        level = "debug",
        err
    )]
    pub async fn list_statuses_by_court_centre(
        &self,
        court_centre_id: CourtCentreId,
    ) -> Result<Vec<StatusRecord>> {
        self.store.list_by_court_centre(court_centre_id).await
    }

    /// Bytes of the stored artifact. `NotFound` unless the file track is
    /// COMPLETED and the artifact is still present.
    #[instrument(
        name = "publication.download_file",
        skip(self),
        err(level = "debug")
    )]
    pub async fn download_file(&self, id: CourtListId) -> Result<Vec<u8>> {
        let record = self.store.get(id).await?;
        let reference = match (&record.file_status, &record.file_url) {
            (TrackStatus::Completed, Some(reference)) => reference.clone(),
            (status, _) => {
                return Err(PublicationError::NotFound(format!(
                    "no file available for court list {id} \
                     (file status {status})"
                )));
            }
        };

        self.content_store.fetch(&reference).await.inspect_err(|err| {
            if matches!(err, PublicationError::NotFound(_)) {
                warn!(
                    file_url = %reference,
                    "completed record points at a missing artifact"
                );
            }
        })
    }

    /// References of every artifact stored for a court centre.
    #[instrument(
        name = "publication.list_artifacts",
        skip(self),
        level = "debug",
        err
    )]
    pub async fn list_artifacts(
        &self,
        court_centre_id: CourtCentreId,
    ) -> Result<Vec<ArtifactRef>> {
        self.content_store
            .list(&self.settings.artifact_folder(court_centre_id))
            .await
    }
}
