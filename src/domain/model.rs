use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw issue record as returned by the source API.
///
/// Deserialized fresh from every fetch response and discarded after the
/// transform step; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub state: String,
    #[serde(alias = "html_url")]
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Document written to the store, keyed by the string form of the issue id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDocument {
    pub id: String,
    pub title: String,
    pub state: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

/// Whether an upsert created a new document or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
}

/// Per-document result collected during the write fan-out. Internal to the
/// orchestrator; consumed immediately by the aggregator.
#[derive(Debug, Clone)]
pub(crate) enum ItemOutcome {
    Written {
        document_id: String,
        kind: WriteKind,
    },
    Failed {
        document_id: String,
        error: String,
    },
}

impl ItemOutcome {
    pub(crate) fn succeeded(&self) -> bool {
        matches!(self, ItemOutcome::Written { .. })
    }
}

/// Run-level result of one sync invocation.
///
/// `PartialFailure` is never constructed with `failed == 0` or an empty error
/// list; that case is `Success`.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Success {
        processed: usize,
        duration: Duration,
    },
    PartialFailure {
        processed: usize,
        failed: usize,
        /// One message per failed document, in the input order of the batch.
        errors: Vec<String>,
        duration: Duration,
    },
    Failure {
        error: String,
        duration: Duration,
    },
}

impl SyncOutcome {
    pub fn duration(&self) -> Duration {
        match self {
            SyncOutcome::Success { duration, .. }
            | SyncOutcome::PartialFailure { duration, .. }
            | SyncOutcome::Failure { duration, .. } => *duration,
        }
    }

    /// Number of documents the run attempted to write.
    pub fn total_attempted(&self) -> usize {
        match self {
            SyncOutcome::Success { processed, .. } => *processed,
            SyncOutcome::PartialFailure {
                processed, failed, ..
            } => processed + failed,
            SyncOutcome::Failure { .. } => 0,
        }
    }

    /// Fraction of attempted documents that were written successfully.
    pub fn success_rate(&self) -> f64 {
        match self {
            SyncOutcome::Success { .. } => 1.0,
            SyncOutcome::PartialFailure {
                processed, failed, ..
            } => *processed as f64 / (processed + failed) as f64,
            SyncOutcome::Failure { .. } => 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. })
    }
}
