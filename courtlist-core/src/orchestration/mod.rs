//! Pipeline orchestration and the queue that feeds it.

pub mod config;
pub mod dispatcher;
pub mod job;
pub mod pipeline;

pub use config::{DispatcherConfig, PipelineSettings, StageTimeouts};
pub use dispatcher::{DispatchOutcome, JobRunner, PublishDispatcher};
pub use job::PublishJob;
pub use pipeline::{PublicationOrchestrator, RunOutcome, Stage, artifact_name};
