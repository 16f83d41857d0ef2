use crate::domain::model::{Issue, IssueDocument};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Source of issue records.
///
/// Implementations classify their own failures into the connector taxonomy
/// before returning them (status code mapping happens at the transport).
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch up to `limit` issues for `owner/repo`.
    async fn fetch_records(&self, owner: &str, repo: &str, limit: usize) -> Result<Vec<Issue>>;
}

/// Document store the sync writes into.
///
/// `save` is an upsert keyed by `document.id`: it creates the document if
/// absent and overwrites it otherwise. The orchestrator relies on this for
/// whole-pipeline retries to be safe.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool>;
    async fn save(&self, document: &IssueDocument) -> Result<()>;
    async fn save_batch(&self, documents: &[IssueDocument]) -> Result<()>;
}

/// Run-outcome sink. Fire-and-forget; the core never consumes a return value.
pub trait MetricsSink: Send + Sync {
    fn record_success(&self, processed: usize, duration: Duration);
    fn record_partial(&self, processed: usize, failed: usize, duration: Duration);
    fn record_failure(&self, error: &str, duration: Duration);
}
