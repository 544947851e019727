use courtlist_model::{CourtCentreId, PublicationMetadataDefaults};
use std::time::Duration;

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on each external call made by a pipeline run. Expiry is a
/// failure of that stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageTimeouts {
    pub fetch: Duration,
    pub render: Duration,
    pub store: Duration,
    /// Token fetch ahead of each hub submission.
    pub authenticate: Duration,
    pub publish: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            fetch: DEFAULT_STAGE_TIMEOUT,
            render: DEFAULT_STAGE_TIMEOUT,
            store: DEFAULT_STAGE_TIMEOUT,
            authenticate: DEFAULT_STAGE_TIMEOUT,
            publish: DEFAULT_STAGE_TIMEOUT,
        }
    }
}

/// Naming and metadata knobs for a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Prepended to the lower-cased list type to form the render template.
    pub template_prefix: String,
    /// Root folder for stored artifacts; each court centre gets a subfolder.
    pub folder_prefix: String,
    pub metadata: PublicationMetadataDefaults,
    pub timeouts: StageTimeouts,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            template_prefix: String::new(),
            folder_prefix: "court-lists".to_string(),
            metadata: PublicationMetadataDefaults::default(),
            timeouts: StageTimeouts::default(),
        }
    }
}

impl PipelineSettings {
    pub fn artifact_folder(&self, court_centre_id: CourtCentreId) -> String {
        format!(
            "{}/{}",
            self.folder_prefix.trim_end_matches('/'),
            court_centre_id
        )
    }
}

/// Sizing for the publish queue and its worker pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    pub workers: usize,
    /// Coalesce a dispatch for an id that is already queued or running.
    pub single_flight: bool,
    pub shutdown_grace: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            workers: 8,
            single_flight: true,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}
