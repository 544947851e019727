use async_trait::async_trait;
use serde::Deserialize;
use std::{fmt, time::Duration};
use tracing::debug;
use url::Url;

use super::{BearerToken, TokenProvider, http_client};
use crate::error::{PublicationError, Result, truncate_body};

const ERROR_BODY_LIMIT: usize = 256;
const MANAGED_IDENTITY_API_VERSION: &str = "2018-02-01";

/// OAuth2 client-credentials grant against a token endpoint.
#[derive(Clone)]
pub struct LocalTokenConfig {
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl fmt::Debug for LocalTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTokenConfig")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Managed identity endpoint available to the hosting environment.
#[derive(Debug, Clone)]
pub struct RemoteTokenConfig {
    pub endpoint: Url,
    pub resource: String,
    pub client_id: Option<String>,
}

/// Which credential flow the identity client uses. Chosen once from
/// configuration; the client never falls back from one flow to the other.
#[derive(Debug, Clone)]
pub enum TokenFlow {
    Local(LocalTokenConfig),
    Remote(RemoteTokenConfig),
}

impl TokenFlow {
    pub fn name(&self) -> &'static str {
        match self {
            TokenFlow::Local(_) => "local",
            TokenFlow::Remote(_) => "remote",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub flow: TokenFlow,
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetches a fresh bearer token on every call. Nothing is cached.
#[derive(Debug, Clone)]
pub struct IdentityTokenClient {
    client: reqwest::Client,
    flow: TokenFlow,
}

impl IdentityTokenClient {
    pub fn new(config: IdentityConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            flow: config.flow,
        })
    }

    pub fn flow(&self) -> &TokenFlow {
        &self.flow
    }

    fn request(&self) -> reqwest::RequestBuilder {
        match &self.flow {
            TokenFlow::Local(local) => {
                self.client.post(local.token_url.clone()).form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", local.client_id.as_str()),
                    ("client_secret", local.client_secret.as_str()),
                    ("scope", local.scope.as_str()),
                ])
            }
            TokenFlow::Remote(remote) => {
                let mut query = vec![
                    ("api-version", MANAGED_IDENTITY_API_VERSION),
                    ("resource", remote.resource.as_str()),
                ];
                if let Some(client_id) = &remote.client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                self.client
                    .get(remote.endpoint.clone())
                    .header("Metadata", "true")
                    .query(&query)
            }
        }
    }
}

#[async_trait]
impl TokenProvider for IdentityTokenClient {
    async fn token(&self) -> Result<BearerToken> {
        let flow = self.flow.name();
        debug!(flow, "requesting bearer token");

        let response = self.request().send().await.map_err(|e| {
            PublicationError::AuthenticationFailed(format!(
                "{flow} token endpoint unreachable: {e}"
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublicationError::AuthenticationFailed(format!(
                "{flow} token endpoint returned {}: {}",
                status.as_u16(),
                truncate_body(&body, ERROR_BODY_LIMIT)
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            PublicationError::AuthenticationFailed(format!(
                "{flow} token response unreadable: {e}"
            ))
        })?;

        if token.access_token.trim().is_empty() {
            return Err(PublicationError::AuthenticationFailed(format!(
                "{flow} token endpoint returned an empty access token"
            )));
        }

        Ok(BearerToken::new(token.access_token))
    }
}
