//! Collaborator ports consumed by the orchestrator, plus their HTTP and
//! on-disk adapters.
//!
//! The orchestrator only sees the traits below; tests swap in fakes.

use async_trait::async_trait;
use courtlist_model::{ArtifactRef, ListQuery, PublicationMetadata};
use std::{fmt, time::Duration};
use url::Url;

use crate::error::{PublicationError, Result};

pub mod assembler;
pub mod content_store;
pub mod hub;
pub mod identity;
pub mod renderer;

pub use assembler::HttpListAssembler;
pub use content_store::CacacheContentStore;
pub use hub::HttpHubPublisher;
pub use identity::{
    IdentityConfig, IdentityTokenClient, LocalTokenConfig, RemoteTokenConfig,
    TokenFlow,
};
pub use renderer::HttpRenderer;

/// Produces the structured list document for a court list.
#[async_trait]
pub trait ListAssembler: Send + Sync {
    /// Errors surface as `UpstreamFetchFailed` carrying the collaborator's
    /// text.
    async fn fetch(&self, query: &ListQuery) -> Result<serde_json::Value>;
}

/// Turns a structured document into distributable bytes (PDF).
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        template_name: &str,
        payload: &serde_json::Value,
    ) -> Result<Vec<u8>>;
}

/// Artifact storage keyed by folder + name.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Writes `bytes` and returns the reference to read them back with.
    /// A second store under the same name replaces the first.
    async fn store(
        &self,
        folder: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<ArtifactRef>;

    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>>;

    async fn list(&self, folder: &str) -> Result<Vec<ArtifactRef>>;
}

/// Bearer token handed to the hub publisher.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetches a fresh token. Failures are `AuthenticationFailed`.
    async fn token(&self) -> Result<BearerToken>;
}

/// Raw outcome of a hub submission. The status code is the only success
/// signal; the body is kept for error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubResponse {
    pub status: u16,
    pub body: String,
}

impl HubResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Submits documents to the publication hub.
///
/// A submission is two calls: `authenticate` mints a fresh token and
/// `submit` posts with it. The orchestrator bounds them separately so a
/// stalled token endpoint is reported as an authentication failure.
#[async_trait]
pub trait HubPublisher: Send + Sync {
    /// Fetches a fresh token for one submission. Failures are
    /// `AuthenticationFailed`.
    async fn authenticate(&self) -> Result<BearerToken>;

    /// Returns whatever status the hub answered with. Transport failures
    /// are `HubUnavailable`.
    async fn submit(
        &self,
        token: &BearerToken,
        document: &serde_json::Value,
        metadata: &PublicationMetadata,
    ) -> Result<HubResponse>;

    /// `authenticate` then `submit`; the hub is not contacted when the
    /// token cannot be obtained.
    async fn publish(
        &self,
        document: &serde_json::Value,
        metadata: &PublicationMetadata,
    ) -> Result<HubResponse> {
        let token = self.authenticate().await?;
        self.submit(&token, document, metadata).await
    }
}

/// Shared client construction for the HTTP adapters.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            PublicationError::Config(format!(
                "Failed to build HTTP client: {e}"
            ))
        })
}

/// `base` with `path` appended, tolerating a trailing slash on `base`.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| {
        PublicationError::Config(format!("Invalid endpoint {joined}: {e}"))
    })
}
