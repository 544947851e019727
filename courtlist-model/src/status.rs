use std::{fmt, str::FromStr};

use crate::error::ModelError;

/// State of one track of a status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TrackStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Pending => "PENDING",
            TrackStatus::InProgress => "IN_PROGRESS",
            TrackStatus::Completed => "COMPLETED",
            TrackStatus::Failed => "FAILED",
        }
    }

    /// Checks a move from `self` to `to`.
    ///
    /// `new_attempt` marks the first transition of a fresh pipeline run; it is
    /// the only way to move a COMPLETED (or stale IN_PROGRESS) track back to
    /// IN_PROGRESS. Nothing ever moves back to PENDING.
    pub fn check_transition(
        self,
        to: TrackStatus,
        new_attempt: bool,
    ) -> Result<(), &'static str> {
        use TrackStatus::*;

        match (self, to) {
            (_, Pending) => Err("tracks never return to PENDING"),
            (Pending | Failed, InProgress) => Ok(()),
            (InProgress | Completed, InProgress) if new_attempt => Ok(()),
            (InProgress, InProgress) => {
                Err("track is already in progress for this attempt")
            }
            (Completed, InProgress) => {
                Err("COMPLETED is terminal without a new attempt")
            }
            (InProgress, Completed | Failed) => Ok(()),
            (_, Completed | Failed) => {
                Err("only an IN_PROGRESS track can finish")
            }
        }
    }
}

impl FromStr for TrackStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TrackStatus::Pending),
            "IN_PROGRESS" => Ok(TrackStatus::InProgress),
            "COMPLETED" => Ok(TrackStatus::Completed),
            "FAILED" => Ok(TrackStatus::Failed),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two independent state machines carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Track {
    /// Delivery of the document to the publication hub.
    Publish,
    /// Rendering and storage of the distributable artifact.
    File,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Publish => write!(f, "publish"),
            Track::File => write!(f, "file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrackStatus::{self, *};

    const ALL: [TrackStatus; 4] = [Pending, InProgress, Completed, Failed];

    #[test]
    fn forward_moves_are_accepted() {
        assert!(Pending.check_transition(InProgress, false).is_ok());
        assert!(InProgress.check_transition(Completed, false).is_ok());
        assert!(InProgress.check_transition(Failed, false).is_ok());
        assert!(Failed.check_transition(InProgress, false).is_ok());
    }

    #[test]
    fn completed_reopens_only_for_a_new_attempt() {
        assert!(Completed.check_transition(InProgress, false).is_err());
        assert!(Completed.check_transition(InProgress, true).is_ok());
        assert!(InProgress.check_transition(InProgress, false).is_err());
        assert!(InProgress.check_transition(InProgress, true).is_ok());
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in ALL {
            assert!(from.check_transition(Pending, true).is_err());
        }
    }

    #[test]
    fn only_in_progress_can_finish() {
        for from in [Pending, Completed, Failed] {
            assert!(from.check_transition(Completed, true).is_err());
            assert!(from.check_transition(Failed, true).is_err());
        }
    }

    #[test]
    fn wire_names_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<TrackStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<TrackStatus>().is_err());
    }
}
