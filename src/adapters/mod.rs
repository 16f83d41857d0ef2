// Adapters layer: concrete implementations of the domain ports (http source,
// file-backed store, metrics sinks).

pub mod metrics;
pub mod source;
pub mod store;

pub use metrics::{InMemoryMetricsSink, LogMetricsSink, MetricsSnapshot};
pub use source::HttpSourceClient;
pub use store::JsonFileStore;
