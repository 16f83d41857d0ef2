pub mod cache;
pub mod orchestrator;
pub mod retry;
pub mod transform;

pub use crate::domain::model::{Issue, IssueDocument, SyncOutcome, WriteKind};
pub use crate::domain::ports::{DocumentStore, MetricsSink, SourceClient};
pub use crate::utils::error::Result;
