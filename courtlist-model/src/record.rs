use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::InvalidTransition,
    ids::{CourtCentreId, CourtListId},
    list_type::CourtListType,
    publication::ArtifactRef,
    status::{Track, TrackStatus},
};

/// Message stored when a track fails without any usable error text.
const UNSPECIFIED_FAILURE: &str = "failed without an error message";

/// Fields supplied by a publish request when a record is first created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NewStatusRecord {
    pub court_list_id: CourtListId,
    pub court_centre_id: CourtCentreId,
    pub court_list_type: CourtListType,
    pub publish_date: NaiveDate,
}

/// Two-track publication status for one court list.
///
/// `publish_status` and `file_status` move independently. `file_url` is only
/// present while `file_status` is COMPLETED and each error message is only
/// present while its track is FAILED.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StatusRecord {
    pub court_list_id: CourtListId,
    pub court_centre_id: CourtCentreId,
    pub court_list_type: CourtListType,
    pub publish_date: NaiveDate,
    pub publish_status: TrackStatus,
    pub file_status: TrackStatus,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub file_url: Option<ArtifactRef>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub publish_error_message: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub file_error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// One requested move of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub track: Track,
    pub to: TrackStatus,
    pub error: Option<String>,
    pub artifact: Option<ArtifactRef>,
    pub new_attempt: bool,
}

impl TransitionRequest {
    /// First transition of a fresh attempt on `track`.
    pub fn start_attempt(track: Track) -> Self {
        Self {
            track,
            to: TrackStatus::InProgress,
            error: None,
            artifact: None,
            new_attempt: true,
        }
    }

    pub fn in_progress(track: Track) -> Self {
        Self {
            new_attempt: false,
            ..Self::start_attempt(track)
        }
    }

    pub fn completed(track: Track) -> Self {
        Self {
            track,
            to: TrackStatus::Completed,
            error: None,
            artifact: None,
            new_attempt: false,
        }
    }

    pub fn file_completed(artifact: ArtifactRef) -> Self {
        Self {
            artifact: Some(artifact),
            ..Self::completed(Track::File)
        }
    }

    pub fn failed(track: Track, error: impl Into<String>) -> Self {
        Self {
            track,
            to: TrackStatus::Failed,
            error: Some(error.into()),
            artifact: None,
            new_attempt: false,
        }
    }
}

impl StatusRecord {
    pub fn new(new: NewStatusRecord, now: DateTime<Utc>) -> Self {
        Self {
            court_list_id: new.court_list_id,
            court_centre_id: new.court_centre_id,
            court_list_type: new.court_list_type,
            publish_date: new.publish_date,
            publish_status: TrackStatus::Pending,
            file_status: TrackStatus::Pending,
            file_url: None,
            publish_error_message: None,
            file_error_message: None,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn status(&self, track: Track) -> TrackStatus {
        match track {
            Track::Publish => self.publish_status,
            Track::File => self.file_status,
        }
    }

    pub fn error_message(&self, track: Track) -> Option<&str> {
        match track {
            Track::Publish => self.publish_error_message.as_deref(),
            Track::File => self.file_error_message.as_deref(),
        }
    }

    /// Computes the record produced by `request`, leaving `self` untouched.
    ///
    /// Every store applies this under its per-record lock so the state machine
    /// and the field invariants are enforced in one place.
    pub fn apply(
        &self,
        request: &TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<StatusRecord, InvalidTransition> {
        let from = self.status(request.track);
        let reject = |reason: &'static str| InvalidTransition {
            track: request.track,
            from,
            to: request.to,
            reason,
        };

        from.check_transition(request.to, request.new_attempt)
            .map_err(reject)?;

        if request.track == Track::File
            && request.to == TrackStatus::Completed
            && request.artifact.is_none()
        {
            return Err(reject("a completed file track needs an artifact"));
        }

        let error = match request.to {
            TrackStatus::Failed => Some(
                request
                    .error
                    .as_deref()
                    .map(str::trim)
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or(UNSPECIFIED_FAILURE)
                    .to_string(),
            ),
            _ => None,
        };

        let mut next = self.clone();
        match request.track {
            Track::Publish => {
                next.publish_status = request.to;
                next.publish_error_message = error;
            }
            Track::File => {
                next.file_status = request.to;
                next.file_error_message = error;
                next.file_url = match request.to {
                    TrackStatus::Completed => request.artifact.clone(),
                    _ => None,
                };
            }
        }
        next.last_updated = now.max(self.last_updated);

        Ok(next)
    }
}
