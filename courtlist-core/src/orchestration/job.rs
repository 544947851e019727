use chrono::{DateTime, Utc};
use courtlist_model::CourtListId;

/// One request to run the pipeline for a court list. The run itself reads
/// the current record, so the job only carries the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishJob {
    pub court_list_id: CourtListId,
    pub requested_at: DateTime<Utc>,
}

impl PublishJob {
    pub fn new(court_list_id: CourtListId) -> Self {
        Self {
            court_list_id,
            requested_at: Utc::now(),
        }
    }
}
