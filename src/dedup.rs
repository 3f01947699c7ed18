//! Deduplication Register Module
//!
//! Collapses concurrent requests for the same fingerprint into one
//! underlying operation. The first caller drives the operation; every
//! caller that arrives while it is in flight subscribes to the shared
//! result and observes the same settled value or error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::cache::{current_timestamp_ms, CacheMetrics};
use crate::error::{CacheError, Result};

// == In-Flight Request ==
/// Bookkeeping for one outstanding operation. At most one exists per key.
#[derive(Debug)]
struct InflightRequest<T> {
    /// When the in-flight request began (Unix milliseconds)
    started_at: u64,
    /// Fan-out channel every waiter subscribes to
    tx: broadcast::Sender<Result<T>>,
}

// == Deduplication Register ==
/// Tracks in-flight requests by key and shares their eventual results.
#[derive(Debug)]
pub struct DeduplicationRegister<T> {
    inflight: Mutex<HashMap<String, InflightRequest<T>>>,
    timeout: Duration,
    metrics: Arc<CacheMetrics>,
}

impl<T: Clone> DeduplicationRegister<T> {
    // == Constructor ==
    /// Creates a register.
    ///
    /// # Arguments
    /// * `timeout` - How long an operation may stay unsettled before the
    ///   shared result rejects with `DeduplicationTimeout`
    /// * `metrics` - Shared counters; dedup hits are recorded here
    pub fn new(timeout: Duration, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            timeout,
            metrics,
        }
    }

    // == Deduplicate ==
    /// Runs `operation` unless one is already in flight for `key`.
    ///
    /// If an entry exists the caller awaits the shared result without
    /// invoking `operation`, and a dedup hit is recorded. Otherwise the
    /// caller becomes the driver: it registers the entry, runs the
    /// operation under the timeout, removes the entry on settle, and
    /// broadcasts the outcome to every waiter.
    ///
    /// On timeout the operation future is dropped, so a late resolution has
    /// nothing left to resurrect; the next call for the same key dispatches
    /// fresh.
    pub async fn deduplicate<F, Fut>(&self, key: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut waiter = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(entry) => {
                    self.metrics.record_dedup_hit();
                    Some(entry.tx.subscribe())
                }
                None => {
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(
                        key.to_string(),
                        InflightRequest {
                            started_at: current_timestamp_ms(),
                            tx,
                        },
                    );
                    None
                }
            }
        };

        if let Some(rx) = waiter.as_mut() {
            return match rx.recv().await {
                Ok(result) => result,
                // The driver dropped without broadcasting; treat it the
                // same as an unsettled request.
                Err(_) => Err(CacheError::DeduplicationTimeout(key.to_string())),
            };
        }

        let result = match tokio::time::timeout(self.timeout, operation()).await {
            Ok(settled) => settled,
            Err(_) => Err(CacheError::DeduplicationTimeout(key.to_string())),
        };

        let removed = self.inflight.lock().await.remove(key);
        if let Some(entry) = removed {
            debug!(
                key,
                elapsed_ms = current_timestamp_ms().saturating_sub(entry.started_at),
                ok = result.is_ok(),
                "in-flight request settled"
            );
            // No waiters is fine; send only fails when every receiver is gone.
            let _ = entry.tx.send(result.clone());
        }

        result
    }

    // == In-Flight Count ==
    /// Number of requests currently in flight.
    pub async fn in_flight_count(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
