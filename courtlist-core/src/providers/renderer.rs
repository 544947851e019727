use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Renderer, endpoint, http_client};
use crate::error::{PublicationError, Result, truncate_body};

const ERROR_BODY_LIMIT: usize = 512;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    template_name: &'a str,
    payload: &'a serde_json::Value,
}

/// Client for the document rendering service (`POST {base}/render`).
///
/// There is no internal retry; an empty body counts as a failed render.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    render_url: Url,
}

impl HttpRenderer {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            render_url: endpoint(base_url, "render")?,
        })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(
        &self,
        template_name: &str,
        payload: &serde_json::Value,
    ) -> Result<Vec<u8>> {
        debug!(template = template_name, "requesting render");

        let response = self
            .client
            .post(self.render_url.clone())
            .header(reqwest::header::ACCEPT, "application/pdf")
            .json(&RenderRequest {
                template_name,
                payload,
            })
            .send()
            .await
            .map_err(|e| {
                PublicationError::RenderingFailed(format!(
                    "renderer unreachable: {e}"
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublicationError::RenderingFailed(format!(
                "renderer returned {}: {}",
                status.as_u16(),
                truncate_body(&body, ERROR_BODY_LIMIT)
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            PublicationError::RenderingFailed(format!(
                "failed to read rendered document: {e}"
            ))
        })?;

        if bytes.is_empty() {
            return Err(PublicationError::RenderingFailed(format!(
                "renderer returned an empty document for template {template_name}"
            )));
        }

        Ok(bytes.to_vec())
    }
}
