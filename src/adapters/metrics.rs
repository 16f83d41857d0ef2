//! Metrics sinks: structured log events, plus an in-memory recorder.

use crate::domain::ports::MetricsSink;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Sink that emits each run outcome as a structured log event.
#[derive(Debug, Clone, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn record_success(&self, processed: usize, duration: Duration) {
        info!(
            outcome = "success",
            processed,
            duration_ms = duration.as_millis() as u64,
            "sync metrics"
        );
    }

    fn record_partial(&self, processed: usize, failed: usize, duration: Duration) {
        warn!(
            outcome = "partial",
            processed,
            failed,
            duration_ms = duration.as_millis() as u64,
            "sync metrics"
        );
    }

    fn record_failure(&self, error: &str, duration: Duration) {
        warn!(
            outcome = "failure",
            error,
            duration_ms = duration.as_millis() as u64,
            "sync metrics"
        );
    }
}

/// Cumulative counters for the current process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub successful_runs: usize,
    pub partial_runs: usize,
    pub failed_runs: usize,
    pub records_processed: usize,
    pub records_failed: usize,
    pub last_error: Option<String>,
}

/// Sink that accumulates counters behind a mutex; health endpoints and tests
/// read them through [`InMemoryMetricsSink::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsSink {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().expect("metrics mutex poisoned").clone()
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record_success(&self, processed: usize, _duration: Duration) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.successful_runs += 1;
        inner.records_processed += processed;
    }

    fn record_partial(&self, processed: usize, failed: usize, _duration: Duration) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.partial_runs += 1;
        inner.records_processed += processed;
        inner.records_failed += failed;
    }

    fn record_failure(&self, error: &str, _duration: Duration) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.failed_runs += 1;
        inner.last_error = Some(error.to_string());
    }
}
