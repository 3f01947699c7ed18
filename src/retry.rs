//! Retry Executor Module
//!
//! Wraps a caller-supplied asynchronous operation with bounded retries and
//! exponential backoff. Orthogonal to caching and deduplication; the engine
//! composes it inside the fetch path but it works standalone.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::CacheMetrics;
use crate::config::RetryConfig;
use crate::error::{CacheError, Result};

// == Default Predicate ==
/// The documented default retry policy: retry when the failure carries no
/// response status (network-level failure) or a status of 500 and above.
/// Client errors (4xx) and non-upstream errors are not retried.
pub fn default_retry_predicate(error: &CacheError) -> bool {
    match error {
        CacheError::Upstream { status: Some(s), .. } => *s >= 500,
        CacheError::Upstream { status: None, .. } => true,
        _ => false,
    }
}

/// Backoff before retry number `retry` (0-based): `retry_delay` grows by
/// `retry_delay_multiplier` per retry, capped at `max_retry_delay`.
fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    // powi saturates to inf for absurd attempt counts; min() brings it back.
    let exponent = retry.min(64) as i32;
    let delay = config.retry_delay as f64 * config.retry_delay_multiplier.powi(exponent);
    Duration::from_millis(delay.min(config.max_retry_delay as f64) as u64)
}

// == Retry Executor ==
/// Executes operations under the configured retry policy.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Arc<CacheMetrics>,
}

impl RetryExecutor {
    // == Constructor ==
    pub fn new(config: RetryConfig, metrics: Arc<CacheMetrics>) -> Self {
        Self { config, metrics }
    }

    // == Execute ==
    /// Runs `operation`, retrying failures up to `max_retries` additional
    /// times with exponential backoff.
    ///
    /// The retry predicate (caller-supplied, or the default) decides which
    /// failures are worth retrying. Once attempts are exhausted the
    /// `on_max_retries_reached` callback fires and the final underlying
    /// error is returned unchanged; errors the predicate rejects propagate
    /// immediately without the exhaustion callback.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        self.metrics.record_retry_success();
                    }
                    return Ok(value);
                }
                Err(error) => {
                    let retryable = match &self.config.retry_condition {
                        Some(predicate) => predicate(&error),
                        None => default_retry_predicate(&error),
                    };

                    if !retryable {
                        return Err(error);
                    }

                    if attempt >= self.config.max_retries {
                        self.metrics.record_retry_failure();
                        if let Some(callback) = &self.config.on_max_retries_reached {
                            callback(&error);
                        }
                        return Err(error);
                    }

                    let delay = backoff_delay(&self.config, attempt);
                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying failed operation"
                    );

                    self.metrics.record_retry_attempt();
                    if let Some(callback) = &self.config.on_retry {
                        callback(&error, attempt + 1);
                    }

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
