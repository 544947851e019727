//! # Courtlist Core
//!
//! Publication workflow engine for court lists. A publish request upserts a
//! two-track status record and queues a pipeline run that fetches the
//! assembled list, renders it, stores the artifact and submits it to the
//! publication hub. Progress is observed by polling the status record.
//!
//! ## Feature Flags
//!
//! - `database` (default): PostgreSQL status store and embedded migrations
//! - `pg-tests`: Postgres-backed integration tests (need `DATABASE_URL`)
//!
//! ## Layout
//!
//! - [`store`]: status record persistence (in-memory and PostgreSQL)
//! - [`providers`]: collaborator ports and their HTTP / on-disk adapters
//! - [`orchestration`]: the pipeline run and the queue that feeds it
//! - [`service`]: the caller-facing operations

pub mod error;
pub mod orchestration;
pub mod providers;
pub mod service;
pub mod store;

pub use error::{PublicationError, Result};
pub use orchestration::{
    DispatchOutcome, DispatcherConfig, JobRunner, PipelineSettings,
    PublicationOrchestrator, PublishDispatcher, PublishJob, RunOutcome,
    StageTimeouts,
};
pub use service::{PublicationService, PublishAccepted};
pub use store::{InMemoryStatusStore, StatusStore, UpsertOutcome};

#[cfg(feature = "database")]
pub use store::PostgresStatusStore;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
