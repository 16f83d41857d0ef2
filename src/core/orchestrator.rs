//! The sync orchestration engine: fetch, transform, fan-out, aggregate.

use crate::core::cache::CachedStore;
use crate::core::retry::RetryPolicy;
use crate::core::transform;
use crate::domain::model::{IssueDocument, ItemOutcome, SyncOutcome, WriteKind};
use crate::domain::ports::{DocumentStore, MetricsSink, SourceClient};
use crate::utils::error::{ConnectorError, Result};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_LIMIT: usize = 30;

/// Tuning knobs for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub fetch_policy: RetryPolicy,
    pub write_policy: RetryPolicy,
    pub pipeline_policy: RetryPolicy,
    /// Upper bound on concurrently in-flight document writes.
    pub max_concurrent_writes: usize,
    pub cache_max_entries: usize,
    pub cache_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_policy: RetryPolicy::source_fetch(),
            write_policy: RetryPolicy::store_write(),
            pipeline_policy: RetryPolicy::pipeline(),
            max_concurrent_writes: 8,
            cache_max_entries: 1024,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Composes one sync pass: fetch records from the source, transform them,
/// upsert each document concurrently, and fold the per-document results into
/// a single [`SyncOutcome`].
///
/// Collaborator failures never escape as errors; they resolve into the
/// returned outcome. The only `Err` this type produces is an immediate
/// argument fault raised before any collaborator is touched.
pub struct SyncOrchestrator<S, D, M> {
    source: S,
    store: CachedStore<D>,
    metrics: M,
    fetch_policy: RetryPolicy,
    write_policy: RetryPolicy,
    pipeline_policy: RetryPolicy,
    max_concurrent_writes: usize,
}

impl<S, D, M> SyncOrchestrator<S, D, M>
where
    S: SourceClient,
    D: DocumentStore,
    M: MetricsSink,
{
    pub fn new(source: S, store: D, metrics: M) -> Self {
        Self::with_config(source, store, metrics, OrchestratorConfig::default())
    }

    pub fn with_config(source: S, store: D, metrics: M, config: OrchestratorConfig) -> Self {
        Self {
            source,
            store: CachedStore::new(store, config.cache_max_entries, config.cache_ttl),
            metrics,
            fetch_policy: config.fetch_policy,
            write_policy: config.write_policy,
            pipeline_policy: config.pipeline_policy,
            max_concurrent_writes: config.max_concurrent_writes.max(1),
        }
    }

    /// Run one sync pass for `owner/repo`, fetching at most `limit` records.
    ///
    /// `Err` is returned only for invalid arguments (blank owner/repo, limit
    /// outside `[1, 100]`), before any collaborator call. Every operational
    /// failure resolves into the returned [`SyncOutcome`].
    pub async fn sync(&self, owner: &str, repo: &str, limit: usize) -> Result<SyncOutcome> {
        validate_args(owner, repo, limit)?;

        let run_id = format!("{:08x}", rand::thread_rng().gen::<u32>());
        let span = info_span!("sync", owner, repo, limit, run_id = %run_id);

        async move {
            let started = Instant::now();
            info!("starting sync run");

            // Each envelope attempt re-runs fetch, transform, and all
            // writes from scratch. Safe because writes are idempotent
            // upserts keyed by record id.
            let outcome = match self
                .pipeline_policy
                .execute("sync_pipeline", || {
                    self.run_pipeline(owner, repo, limit, started)
                })
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => SyncOutcome::Failure {
                    error: err.to_string(),
                    duration: started.elapsed(),
                },
            };

            self.report(&outcome);
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(
        &self,
        owner: &str,
        repo: &str,
        limit: usize,
        started: Instant,
    ) -> Result<SyncOutcome> {
        let records = self
            .fetch_policy
            .execute("fetch_records", || {
                self.source.fetch_records(owner, repo, limit)
            })
            .await?;

        if records.is_empty() {
            debug!("source returned no records");
            return Ok(SyncOutcome::Success {
                processed: 0,
                duration: started.elapsed(),
            });
        }

        let documents = transform::transform_batch(&records)?;
        debug!(
            fetched = records.len(),
            transformed = documents.len(),
            "batch transformed"
        );

        let outcomes = self.write_all(&documents).await;
        Ok(aggregate(outcomes, started.elapsed()))
    }

    /// Fan out one write task per document over a bounded pool. `buffered`
    /// yields results in input order, which is what the aggregated error
    /// list is required to preserve.
    async fn write_all(&self, documents: &[IssueDocument]) -> Vec<ItemOutcome> {
        stream::iter(documents)
            .map(|document| self.write_one(document))
            .buffered(self.max_concurrent_writes)
            .collect()
            .await
    }

    /// One document's failure is contained here: it becomes data, never an
    /// error that could cancel sibling writes.
    async fn write_one(&self, document: &IssueDocument) -> ItemOutcome {
        match self.check_and_upsert(document).await {
            Ok(kind) => {
                debug!(document_id = %document.id, kind = ?kind, "document written");
                ItemOutcome::Written {
                    document_id: document.id.clone(),
                    kind,
                }
            }
            Err(err) => {
                warn!(
                    document_id = %document.id,
                    code = err.code(),
                    error = %err,
                    "document write failed after retries"
                );
                ItemOutcome::Failed {
                    document_id: document.id.clone(),
                    error: err.to_string(),
                }
            }
        }
    }

    async fn check_and_upsert(&self, document: &IssueDocument) -> Result<WriteKind> {
        let existed = self
            .write_policy
            .execute("store_exists", || self.store.exists(&document.id))
            .await?;

        // The same write call serves both create and update; the store is
        // not told which.
        self.write_policy
            .execute("store_save", || self.store.save(document))
            .await?;

        Ok(if existed {
            WriteKind::Updated
        } else {
            WriteKind::Created
        })
    }

    fn report(&self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Success {
                processed,
                duration,
            } => {
                info!(processed, duration_ms = duration.as_millis() as u64, "sync succeeded");
                self.metrics.record_success(*processed, *duration);
            }
            SyncOutcome::PartialFailure {
                processed,
                failed,
                duration,
                ..
            } => {
                warn!(
                    processed,
                    failed,
                    duration_ms = duration.as_millis() as u64,
                    "sync partially failed"
                );
                self.metrics.record_partial(*processed, *failed, *duration);
            }
            SyncOutcome::Failure { error, duration } => {
                error!(
                    error = %error,
                    duration_ms = duration.as_millis() as u64,
                    "sync failed"
                );
                self.metrics.record_failure(error, *duration);
            }
        }
    }
}

fn validate_args(owner: &str, repo: &str, limit: usize) -> Result<()> {
    if owner.trim().is_empty() || repo.trim().is_empty() {
        return Err(ConnectorError::validation("owner/name cannot be blank"));
    }
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ConnectorError::validation(
            "Limit must be between 1 and 100",
        ));
    }
    Ok(())
}

fn aggregate(outcomes: Vec<ItemOutcome>, duration: Duration) -> SyncOutcome {
    let processed = outcomes.iter().filter(|o| o.succeeded()).count();
    let errors: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ItemOutcome::Failed { document_id, error } => {
                Some(format!("{document_id}: {error}"))
            }
            ItemOutcome::Written { .. } => None,
        })
        .collect();

    if errors.is_empty() {
        SyncOutcome::Success {
            processed,
            duration,
        }
    } else if processed == 0 {
        SyncOutcome::Failure {
            error: "All sync operations failed".to_string(),
            duration,
        }
    } else {
        SyncOutcome::PartialFailure {
            processed,
            failed: errors.len(),
            errors,
            duration,
        }
    }
}
