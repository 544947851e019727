use async_trait::async_trait;
use courtlist_model::PublicationMetadata;
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::debug;
use url::Url;

use super::{
    BearerToken, HubPublisher, HubResponse, TokenProvider, http_client,
};
use crate::error::{PublicationError, Result};

#[derive(Serialize)]
struct HubSubmission<'a> {
    document: &'a serde_json::Value,
    metadata: &'a PublicationMetadata,
}

/// Posts documents to the publication hub with a freshly minted token.
#[derive(Clone)]
pub struct HttpHubPublisher {
    client: reqwest::Client,
    url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl fmt::Debug for HttpHubPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHubPublisher")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpHubPublisher {
    pub fn new(
        url: Url,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url,
            tokens,
        })
    }
}

#[async_trait]
impl HubPublisher for HttpHubPublisher {
    async fn authenticate(&self) -> Result<BearerToken> {
        self.tokens.token().await
    }

    async fn submit(
        &self,
        token: &BearerToken,
        document: &serde_json::Value,
        metadata: &PublicationMetadata,
    ) -> Result<HubResponse> {
        debug!(
            court_id = %metadata.court_id,
            list_type = %metadata.list_type,
            content_date = %metadata.content_date,
            "submitting to publication hub"
        );

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(token.as_str())
            .json(&HubSubmission { document, metadata })
            .send()
            .await
            .map_err(|e| {
                PublicationError::HubUnavailable(format!(
                    "publication hub unreachable: {e}"
                ))
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HubResponse { status, body })
    }
}
