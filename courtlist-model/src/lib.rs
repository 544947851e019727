//! Core data model definitions shared across the court list publication crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod list_type;
pub mod publication;
pub mod record;
pub mod status;

// Intentionally curated re-exports for downstream consumers.
pub use error::{InvalidTransition, ModelError, Result as ModelResult};
pub use ids::{CourtCentreId, CourtListId};
pub use list_type::CourtListType;
pub use publication::{
    ArtifactRef, ListQuery, PublicationMetadata, PublicationMetadataDefaults,
};
pub use record::{NewStatusRecord, StatusRecord, TransitionRequest};
pub use status::{Track, TrackStatus};
