//! HTTP source client for a GitHub-style issues endpoint.

use crate::domain::model::Issue;
use crate::domain::ports::SourceClient;
use crate::utils::error::{ConnectorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("issue-sync/", env!("CARGO_PKG_VERSION"));
/// Page size requested from the source. Limits above this are satisfied by
/// walking consecutive pages.
const PAGE_SIZE: usize = 30;

/// Paginated issues client over `GET {base_url}/repos/{owner}/{repo}/issues`.
///
/// Failures are classified into the connector taxonomy here, at the origin:
/// a non-success status maps to `SourceApi` (with `Retry-After` parsed on
/// 429), transport and decode errors to `SourceUnavailable`.
pub struct HttpSourceClient {
    client: Client,
    base_url: String,
}

impl HttpSourceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Issue>> {
        let url = format!("{}/repos/{}/{}/issues", self.base_url, owner, repo);
        debug!(url = %url, page, per_page, "fetching issues page");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("state", "all".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .map_err(ConnectorError::from)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ConnectorError::from_source_status(
                status.as_u16(),
                retry_after,
            ));
        }

        response.json().await.map_err(ConnectorError::from)
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch_records(&self, owner: &str, repo: &str, limit: usize) -> Result<Vec<Issue>> {
        let per_page = limit.min(PAGE_SIZE);
        let mut records = Vec::with_capacity(limit);
        let mut page = 1;

        while records.len() < limit {
            let batch = self.fetch_page(owner, repo, page, per_page).await?;
            let batch_len = batch.len();
            records.extend(batch);
            // A short page means the source has no more records.
            if batch_len < per_page {
                break;
            }
            page += 1;
        }

        records.truncate(limit);
        debug!(owner, repo, fetched = records.len(), "fetch complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn issue_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("Issue {id}"),
            "state": "open",
            "html_url": format!("https://github.com/acme/widgets/issues/{id}"),
            "created_at": "2024-05-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_single_page() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/issues")
                .query_param("per_page", "10")
                .query_param("page", "1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([issue_json(1), issue_json(2)]));
        });

        let client = HttpSourceClient::new(server.base_url());
        let records = client.fetch_records("acme", "widgets", 10).await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_walks_pages_until_limit() {
        let server = MockServer::start();
        let page1: Vec<_> = (1..=30).map(issue_json).collect();
        let page2: Vec<_> = (31..=50).map(issue_json).collect();

        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/issues")
                .query_param("per_page", "30")
                .query_param("page", "1");
            then.status(200).json_body(serde_json::json!(page1));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/issues")
                .query_param("per_page", "30")
                .query_param("page", "2");
            then.status(200).json_body(serde_json::json!(page2));
        });

        let client = HttpSourceClient::new(server.base_url());
        let records = client.fetch_records("acme", "widgets", 50).await.unwrap();

        first.assert();
        second.assert();
        assert_eq!(records.len(), 50);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[49].id, 50);
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_limit() {
        let server = MockServer::start();
        let page: Vec<_> = (1..=30).map(issue_json).collect();

        // The source answers a full page for every page number.
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(200).json_body(serde_json::json!(page));
        });

        let client = HttpSourceClient::new(server.base_url());
        let records = client.fetch_records("acme", "widgets", 35).await.unwrap();

        assert_eq!(records.len(), 35);
    }

    #[tokio::test]
    async fn test_short_page_ends_the_walk() {
        let server = MockServer::start();
        let page: Vec<_> = (1..=4).map(issue_json).collect();

        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(200).json_body(serde_json::json!(page));
        });

        let client = HttpSourceClient::new(server.base_url());
        let records = client.fetch_records("acme", "widgets", 50).await.unwrap();

        // 4 < per_page, so the source is exhausted after one call.
        api_mock.assert_hits(1);
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_source_api() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(500);
        });

        let client = HttpSourceClient::new(server.base_url());
        let err = client.fetch_records("acme", "widgets", 10).await.unwrap_err();

        assert_eq!(err, ConnectorError::from_source_status(500, None));
        use crate::utils::error::Retryable;
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_not_found_is_terminal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(404);
        });

        let client = HttpSourceClient::new(server.base_url());
        let err = client.fetch_records("acme", "widgets", 10).await.unwrap_err();

        use crate::utils::error::Retryable;
        assert_eq!(err, ConnectorError::from_source_status(404, None));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(429).header("Retry-After", "42");
        });

        let client = HttpSourceClient::new(server.base_url());
        let err = client.fetch_records("acme", "widgets", 10).await.unwrap_err();

        assert_eq!(err, ConnectorError::from_source_status(429, Some(42)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_source_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues");
            then.status(200)
                .header("Content-Type", "application/json")
                .body("not json at all");
        });

        let client = HttpSourceClient::new(server.base_url());
        let err = client.fetch_records("acme", "widgets", 10).await.unwrap_err();

        use crate::utils::error::Retryable;
        assert!(matches!(err, ConnectorError::SourceUnavailable { .. }), "{err:?}");
        assert!(!err.is_retryable());
    }
}
