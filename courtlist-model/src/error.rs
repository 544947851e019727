use std::fmt::{self, Display};

use crate::status::{Track, TrackStatus};

/// A rejected status change. The record it was checked against is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub track: Track,
    pub from: TrackStatus,
    pub to: TrackStatus,
    pub reason: &'static str,
}

impl Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} transition {} -> {}: {}",
            self.track, self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidTransition(InvalidTransition),
    InvalidListType(String),
    InvalidStatus(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidTransition(err) => write!(f, "{err}"),
            ModelError::InvalidListType(msg) => {
                write!(f, "invalid court list type: {msg}")
            }
            ModelError::InvalidStatus(msg) => {
                write!(f, "invalid track status: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::InvalidTransition(err) => Some(err),
            ModelError::InvalidListType(_) | ModelError::InvalidStatus(_) => {
                None
            }
        }
    }
}

impl From<InvalidTransition> for ModelError {
    fn from(err: InvalidTransition) -> Self {
        ModelError::InvalidTransition(err)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
