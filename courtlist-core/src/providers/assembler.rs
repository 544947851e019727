use async_trait::async_trait;
use courtlist_model::ListQuery;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ListAssembler, endpoint, http_client};
use crate::error::{PublicationError, Result, truncate_body};

const ERROR_BODY_LIMIT: usize = 512;

/// Fetches assembled list documents over HTTP:
/// `GET {base}/court-lists?listType=..&courtCentreId=..&startDate=..`.
#[derive(Debug, Clone)]
pub struct HttpListAssembler {
    client: reqwest::Client,
    lists_url: Url,
}

impl HttpListAssembler {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            lists_url: endpoint(base_url, "court-lists")?,
        })
    }

    fn query_pairs(query: &ListQuery) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("listType", query.list_type.to_string()),
            ("courtCentreId", query.court_centre_id.to_string()),
            ("startDate", query.start_date.to_string()),
            ("endDate", query.end_date.to_string()),
            ("restricted", query.restricted.to_string()),
        ];
        if let Some(room) = &query.court_room_id {
            pairs.push(("courtRoomId", room.clone()));
        }
        pairs
    }
}

#[async_trait]
impl ListAssembler for HttpListAssembler {
    async fn fetch(&self, query: &ListQuery) -> Result<serde_json::Value> {
        debug!(
            court_list_id = %query.court_list_id,
            court_centre_id = %query.court_centre_id,
            list_type = %query.list_type,
            "fetching assembled court list"
        );

        let response = self
            .client
            .get(self.lists_url.clone())
            .query(&Self::query_pairs(query))
            .send()
            .await
            .map_err(|e| {
                PublicationError::UpstreamFetchFailed(format!(
                    "list assembler unreachable: {e}"
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublicationError::UpstreamFetchFailed(format!(
                "list assembler returned {}: {}",
                status.as_u16(),
                truncate_body(&body, ERROR_BODY_LIMIT)
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            PublicationError::UpstreamFetchFailed(format!(
                "list assembler returned an unreadable document: {e}"
            ))
        })
    }
}
