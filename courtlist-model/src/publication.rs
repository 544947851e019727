use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    ids::{CourtCentreId, CourtListId},
    list_type::CourtListType,
    record::StatusRecord,
};

/// Reference to a stored artifact, as handed back by the content store.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArtifactRef").field(&self.0).finish()
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query sent to the upstream data assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub court_list_id: CourtListId,
    pub list_type: CourtListType,
    pub court_centre_id: CourtCentreId,
    pub court_room_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub restricted: bool,
}

impl ListQuery {
    /// Public, whole-centre query covering the record's publish date only.
    pub fn for_record(record: &StatusRecord) -> Self {
        Self {
            court_list_id: record.court_list_id,
            list_type: record.court_list_type.clone(),
            court_centre_id: record.court_centre_id,
            court_room_id: None,
            start_date: record.publish_date,
            end_date: record.publish_date,
            restricted: false,
        }
    }
}

/// Deployment-level values stamped on every hub submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationMetadataDefaults {
    pub provenance: String,
    pub language: String,
    pub sensitivity: String,
}

impl Default for PublicationMetadataDefaults {
    fn default() -> Self {
        Self {
            provenance: "COMMON_PLATFORM".to_string(),
            language: "ENGLISH".to_string(),
            sensitivity: "PUBLIC".to_string(),
        }
    }
}

/// Metadata accompanying a document posted to the publication hub.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PublicationMetadata {
    pub provenance: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    pub list_type: CourtListType,
    pub court_id: CourtCentreId,
    pub content_date: NaiveDate,
    pub language: String,
    pub sensitivity: String,
    pub display_from: DateTime<Utc>,
    pub display_to: DateTime<Utc>,
}

impl PublicationMetadata {
    pub const LIST_KIND: &'static str = "LIST";

    /// Metadata for `record`, displayed for the whole of its publish date.
    pub fn for_record(
        record: &StatusRecord,
        defaults: &PublicationMetadataDefaults,
    ) -> Self {
        let day = record.publish_date;
        let display_from = day.and_time(NaiveTime::MIN).and_utc();
        let display_to = day
            .and_hms_opt(23, 59, 59)
            .map(|end| end.and_utc())
            .unwrap_or(display_from);

        Self {
            provenance: defaults.provenance.clone(),
            kind: Self::LIST_KIND.to_string(),
            list_type: record.court_list_type.clone(),
            court_id: record.court_centre_id,
            content_date: day,
            language: defaults.language.clone(),
            sensitivity: defaults.sensitivity.clone(),
            display_from,
            display_to,
        }
    }
}
