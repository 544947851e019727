//! Durable two-track status records, one per court list.

use async_trait::async_trait;
use courtlist_model::{
    CourtCentreId, CourtListId, NewStatusRecord, StatusRecord,
    TransitionRequest,
};

use crate::error::Result;

pub mod memory;
#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::InMemoryStatusStore;
#[cfg(feature = "database")]
pub use postgres::PostgresStatusStore;

/// Result of an idempotent upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub record: StatusRecord,
    /// `false` when the record already existed and was returned unchanged.
    pub created: bool,
}

/// Store for status records. Implementations must make `upsert` and
/// `transition` atomic per record.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Create the record with both tracks PENDING, or return the existing
    /// record untouched.
    async fn upsert(&self, new: NewStatusRecord) -> Result<UpsertOutcome>;

    /// Fails with `NotFound` when no record exists for `id`.
    async fn get(&self, id: CourtListId) -> Result<StatusRecord>;

    /// Records for one court centre ordered by publish date, then list id.
    async fn list_by_court_centre(
        &self,
        court_centre_id: CourtCentreId,
    ) -> Result<Vec<StatusRecord>>;

    /// Apply one track transition. A rejected transition leaves the record
    /// unchanged and surfaces `InvalidTransition`.
    async fn transition(
        &self,
        id: CourtListId,
        request: TransitionRequest,
    ) -> Result<StatusRecord>;
}

pub(crate) fn not_found(id: CourtListId) -> crate::error::PublicationError {
    crate::error::PublicationError::NotFound(format!(
        "no status record for court list {id}"
    ))
}
