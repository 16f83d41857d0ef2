pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::SyncConfig;

pub use adapters::{HttpSourceClient, InMemoryMetricsSink, JsonFileStore, LogMetricsSink};
pub use core::orchestrator::{OrchestratorConfig, SyncOrchestrator};
pub use core::retry::{BackoffConfig, RetryPolicy};
pub use domain::model::{Issue, IssueDocument, SyncOutcome};
pub use domain::ports::{DocumentStore, MetricsSink, SourceClient};
pub use utils::error::{ConnectorError, Result, StoreErrorKind};
