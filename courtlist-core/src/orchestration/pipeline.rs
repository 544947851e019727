use async_trait::async_trait;
use courtlist_model::{
    CourtListId, ListQuery, PublicationMetadata, StatusRecord, Track,
    TransitionRequest,
};
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};

use super::{config::PipelineSettings, dispatcher::JobRunner, job::PublishJob};
use crate::{
    error::{PublicationError, Result, truncate_body},
    providers::{ContentStore, HubPublisher, ListAssembler, Renderer},
    store::StatusStore,
};

const HUB_BODY_LIMIT: usize = 512;

/// External step of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Render,
    Store,
    Authenticate,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Render => "render",
            Stage::Store => "store",
            Stage::Authenticate => "authenticate",
            Stage::Publish => "publish",
        }
    }

    fn timed_out(self, limit: Duration) -> PublicationError {
        let text = format!(
            "{} stage timed out after {}ms",
            self.as_str(),
            limit.as_millis()
        );
        match self {
            Stage::Fetch => PublicationError::UpstreamFetchFailed(text),
            Stage::Render => PublicationError::RenderingFailed(text),
            Stage::Store => PublicationError::StorageFailed(text),
            Stage::Authenticate => PublicationError::AuthenticationFailed(text),
            Stage::Publish => PublicationError::HubUnavailable(text),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended. Every variant other than `Aborted` has already been
/// written to the status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published,
    FileFailed { stage: Stage, message: String },
    PublishFailed { message: String },
    /// A transition could not be persisted; the record reflects the last
    /// transition that was.
    Aborted { reason: String },
}

/// Drives fetch, render, store and publish for one court list, recording
/// each outcome on the status record.
#[derive(Clone)]
pub struct PublicationOrchestrator {
    store: Arc<dyn StatusStore>,
    assembler: Arc<dyn ListAssembler>,
    renderer: Arc<dyn Renderer>,
    content_store: Arc<dyn ContentStore>,
    hub: Arc<dyn HubPublisher>,
    settings: PipelineSettings,
}

impl fmt::Debug for PublicationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicationOrchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

async fn bounded<T>(
    stage: Stage,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(stage.timed_out(limit)),
    }
}

impl PublicationOrchestrator {
    pub fn new(
        store: Arc<dyn StatusStore>,
        assembler: Arc<dyn ListAssembler>,
        renderer: Arc<dyn Renderer>,
        content_store: Arc<dyn ContentStore>,
        hub: Arc<dyn HubPublisher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            assembler,
            renderer,
            content_store,
            hub,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs the whole pipeline once. Never returns an error: stage failures
    /// become FAILED transitions, and a store failure ends the run.
    #[instrument(
        name = "publication.run",
        skip(self, id),
        fields(court_list_id = %id)
    )]
    pub async fn run(&self, id: CourtListId) -> RunOutcome {
        match self.execute(id).await {
            Ok(outcome) => {
                match &outcome {
                    RunOutcome::Published => info!("court list published"),
                    RunOutcome::FileFailed { stage, .. } => {
                        info!(stage = %stage, "run ended on the file track")
                    }
                    RunOutcome::PublishFailed { .. } => {
                        info!("run ended on the publish track")
                    }
                    RunOutcome::Aborted { .. } => {}
                }
                outcome
            }
            Err(err) => {
                error!(
                    error = %err,
                    "failed to persist status transition; run aborted"
                );
                RunOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Stage errors are handled inline; only store errors reach `?`.
    async fn execute(&self, id: CourtListId) -> Result<RunOutcome> {
        let timeouts = self.settings.timeouts;

        let record = self
            .store
            .transition(id, TransitionRequest::start_attempt(Track::File))
            .await?;
        info!(
            court_centre_id = %record.court_centre_id,
            status = %record.file_status,
            "file track started"
        );

        let query = ListQuery::for_record(&record);
        let document = match bounded(
            Stage::Fetch,
            timeouts.fetch,
            self.assembler.fetch(&query),
        )
        .await
        {
            Ok(document) => document,
            Err(err) => return self.fail_file(id, Stage::Fetch, err).await,
        };

        let template = self.template_name(&record);
        let rendered = bounded(
            Stage::Render,
            timeouts.render,
            self.renderer.render(&template, &document),
        )
        .await
        .and_then(|bytes| {
            if bytes.is_empty() {
                Err(PublicationError::RenderingFailed(format!(
                    "renderer produced no output for template {template}"
                )))
            } else {
                Ok(bytes)
            }
        });
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(err) => return self.fail_file(id, Stage::Render, err).await,
        };

        let folder = self.settings.artifact_folder(record.court_centre_id);
        let name = artifact_name(&record);
        let artifact = match bounded(
            Stage::Store,
            timeouts.store,
            self.content_store.store(&folder, &name, &bytes),
        )
        .await
        {
            Ok(artifact) => artifact,
            Err(err) => return self.fail_file(id, Stage::Store, err).await,
        };

        let record = self
            .store
            .transition(id, TransitionRequest::file_completed(artifact))
            .await?;
        info!(
            file_url = record.file_url.as_ref().map(|a| a.as_str()),
            status = %record.file_status,
            "file track completed"
        );

        let record = self
            .store
            .transition(id, TransitionRequest::start_attempt(Track::Publish))
            .await?;
        info!(status = %record.publish_status, "publish track started");

        let metadata =
            PublicationMetadata::for_record(&record, &self.settings.metadata);
        let published = match bounded(
            Stage::Authenticate,
            timeouts.authenticate,
            self.hub.authenticate(),
        )
        .await
        {
            Ok(token) => bounded(
                Stage::Publish,
                timeouts.publish,
                self.hub.submit(&token, &document, &metadata),
            )
            .await
            .and_then(|response| {
                if response.is_success() {
                    Ok(())
                } else {
                    Err(PublicationError::HubRejected {
                        status: response.status,
                        body: truncate_body(&response.body, HUB_BODY_LIMIT),
                    })
                }
            })
            .map_err(|err| (Stage::Publish, err)),
            Err(err) => Err((Stage::Authenticate, err)),
        };

        match published {
            Ok(()) => {
                self.store
                    .transition(
                        id,
                        TransitionRequest::completed(Track::Publish),
                    )
                    .await?;
                Ok(RunOutcome::Published)
            }
            Err((stage, err)) => {
                let message = err.to_string();
                warn!(stage = %stage, error = %message, "stage failed");
                let request =
                    TransitionRequest::failed(Track::Publish, message.clone());
                self.store.transition(id, request).await?;
                Ok(RunOutcome::PublishFailed { message })
            }
        }
    }

    async fn fail_file(
        &self,
        id: CourtListId,
        stage: Stage,
        err: PublicationError,
    ) -> Result<RunOutcome> {
        let message = err.to_string();
        warn!(stage = %stage, error = %message, "stage failed");
        self.store
            .transition(
                id,
                TransitionRequest::failed(Track::File, message.clone()),
            )
            .await?;
        Ok(RunOutcome::FileFailed { stage, message })
    }

    fn template_name(&self, record: &StatusRecord) -> String {
        format!(
            "{}{}",
            self.settings.template_prefix,
            record.court_list_type.template_key()
        )
    }
}

/// `{listType}_{publishDate}_{courtListId}.pdf`
pub fn artifact_name(record: &StatusRecord) -> String {
    format!(
        "{}_{}_{}.pdf",
        record.court_list_type, record.publish_date, record.court_list_id
    )
}

#[async_trait]
impl JobRunner for PublicationOrchestrator {
    async fn run_job(&self, job: PublishJob) -> RunOutcome {
        self.run(job.court_list_id).await
    }
}
