use courtlist_model::{InvalidTransition, ModelError};
use thiserror::Error;

/// Every failure the publication workflow can report.
///
/// Pipeline stages never hand these back to the publish caller; the
/// orchestrator records them on the status record instead.
#[derive(Error, Debug)]
pub enum PublicationError {
    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    #[error("rendering failed: {0}")]
    RenderingFailed(String),

    #[error("storage failed: {0}")]
    StorageFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("hub rejected publication with status {status}: {body}")]
    HubRejected { status: u16, body: String },

    #[error("hub unavailable: {0}")]
    HubUnavailable(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("publish queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("publish dispatcher is shutting down")]
    ShuttingDown,

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for PublicationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidTransition(inner) => {
                PublicationError::InvalidTransition(inner)
            }
            other => PublicationError::InvalidRequest(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PublicationError>;

/// Shortens collaborator response bodies before they land in error text.
pub(crate) fn truncate_body(body: &str, limit: usize) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= limit {
        return trimmed.to_string();
    }
    let mut end = limit;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_rejection_message_carries_the_status_code() {
        let err = PublicationError::HubRejected {
            status: 502,
            body: "bad gateway".into(),
        };
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("bad gateway"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        assert_eq!(truncate_body("  short ", 16), "short");
        assert_eq!(truncate_body("ééééé", 3), "é...");
    }
}
