use crate::utils::error::{ConnectorError, Retryable};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff shape for one operation class.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// When set, each delay is scaled to 50-100% of the computed value.
    pub jitter: bool,
}

/// Bounded-attempt execution policy.
///
/// One instance exists per operation class (source fetch, store write, whole
/// pipeline), each with its own attempt budget and backoff shape. Policies
/// are stateless across invocations; the attempt counter is local to a
/// single `execute` call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    pub backoff: BackoffConfig,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffConfig) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy tuned for source API calls: short base delay, generous cap,
    /// jitter to spread rate-limit retries.
    pub fn source_fetch() -> Self {
        Self::new(
            3,
            BackoffConfig {
                initial_delay: Duration::from_millis(500),
                multiplier: 2.0,
                max_delay: Duration::from_secs(10),
                jitter: true,
            },
        )
    }

    /// Policy for individual store operations.
    pub fn store_write() -> Self {
        Self::new(
            3,
            BackoffConfig {
                initial_delay: Duration::from_millis(200),
                multiplier: 2.0,
                max_delay: Duration::from_secs(5),
                jitter: true,
            },
        )
    }

    /// Outer envelope around an entire sync pass: two attempts, linear delay.
    pub fn pipeline() -> Self {
        Self::new(
            2,
            BackoffConfig {
                initial_delay: Duration::from_secs(1),
                multiplier: 1.0,
                max_delay: Duration::from_secs(1),
                jitter: false,
            },
        )
    }

    /// Zero-delay variant of any policy, for tests.
    #[cfg(test)]
    pub(crate) fn immediate(max_attempts: u32) -> Self {
        Self::new(
            max_attempts,
            BackoffConfig {
                initial_delay: Duration::ZERO,
                multiplier: 1.0,
                max_delay: Duration::ZERO,
                jitter: false,
            },
        )
    }

    /// Delay slept after failed attempt `attempt` (1-based):
    /// `min(initial_delay * multiplier^(attempt-1), max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff.initial_delay.as_secs_f64()
            * self.backoff.multiplier.powi(attempt as i32 - 1);
        let capped = base.min(self.backoff.max_delay.as_secs_f64());

        let secs = if self.backoff.jitter {
            capped * rand::thread_rng().gen_range(0.5..1.0)
        } else {
            capped
        };

        Duration::from_secs_f64(secs)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or exhausts the attempt budget. The error returned is always already
    /// classified; retry decisions come from the classification alone.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, ConnectorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ConnectorError>>,
    {
        let mut attempt: u32 = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    debug!(operation = operation_name, attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    if !err.is_retryable() {
                        debug!(
                            operation = operation_name,
                            attempt,
                            code = err.code(),
                            error = %err,
                            "non-retryable error, giving up"
                        );
                        return Err(err);
                    }
                    if attempt >= self.max_attempts {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            max_attempts = self.max_attempts,
                            code = err.code(),
                            error = %err,
                            "attempt budget exhausted"
                        );
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt);
                    debug!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
