use async_trait::async_trait;
use chrono::Utc;
use courtlist_model::{
    CourtCentreId, CourtListId, NewStatusRecord, StatusRecord,
    TransitionRequest,
};
use dashmap::{DashMap, mapref::entry::Entry};
use std::fmt;
use tracing::debug;

use super::{StatusStore, UpsertOutcome, not_found};
use crate::error::Result;

/// Process-local status store. Each record sits behind its shard lock, which
/// makes upsert and transition atomic per record.
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: DashMap<CourtListId, StatusRecord>,
}

impl fmt::Debug for InMemoryStatusStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStatusStore")
            .field("records", &self.records.len())
            .finish()
    }
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn upsert(&self, new: NewStatusRecord) -> Result<UpsertOutcome> {
        match self.records.entry(new.court_list_id) {
            Entry::Occupied(existing) => Ok(UpsertOutcome {
                record: existing.get().clone(),
                created: false,
            }),
            Entry::Vacant(slot) => {
                let record = StatusRecord::new(new, Utc::now());
                slot.insert(record.clone());
                Ok(UpsertOutcome {
                    record,
                    created: true,
                })
            }
        }
    }

    async fn get(&self, id: CourtListId) -> Result<StatusRecord> {
        self.records
            .get(&id)
            .map(|record| record.value().clone())
            .ok_or_else(|| not_found(id))
    }

    async fn list_by_court_centre(
        &self,
        court_centre_id: CourtCentreId,
    ) -> Result<Vec<StatusRecord>> {
        let mut records: Vec<StatusRecord> = self
            .records
            .iter()
            .filter(|entry| entry.court_centre_id == court_centre_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.publish_date
                .cmp(&b.publish_date)
                .then_with(|| a.court_list_id.cmp(&b.court_list_id))
        });
        Ok(records)
    }

    async fn transition(
        &self,
        id: CourtListId,
        request: TransitionRequest,
    ) -> Result<StatusRecord> {
        let mut entry = self.records.get_mut(&id).ok_or_else(|| not_found(id))?;
        let next = entry.apply(&request, Utc::now())?;
        *entry = next.clone();
        debug!(
            court_list_id = %id,
            track = %request.track,
            status = %request.to,
            "status transition applied"
        );
        Ok(next)
    }
}
