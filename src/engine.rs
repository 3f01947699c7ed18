//! Request Cache Engine
//!
//! The facade composing the cache store, codec pipeline, deduplication
//! register and retry executor behind one explicitly constructed, owned
//! instance. There is no module-level default engine: tests and callers
//! create isolated instances and pass them where needed.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{
    CacheDiagnostics, CacheEntry, CacheMetrics, CacheStore, CodecPipeline, MetricsSnapshot,
    OptimizeReport,
};
use crate::config::{validate_config, RequestCacheConfig};
use crate::dedup::DeduplicationRegister;
use crate::error::{CacheError, Result};
use crate::retry::RetryExecutor;
use crate::tasks::spawn_cleanup_task;

// == Export Payload ==
/// Serialized form of an engine's full state.
#[derive(Debug, Serialize, Deserialize)]
struct CacheExport {
    entries: Vec<CacheEntry>,
    metrics: MetricsSnapshot,
    config: RequestCacheConfig,
}

// == Request Cache ==
/// Client-side request cache with TTL expiry, in-flight deduplication and
/// retry. One instance owns its store, metrics and background sweep task.
///
/// Must be constructed inside a tokio runtime (the sweep task is spawned at
/// construction). Call [`RequestCache::shutdown`] when discarding the
/// engine; `Drop` aborts the sweep as a backstop.
#[derive(Debug)]
pub struct RequestCache<T> {
    config: RequestCacheConfig,
    store: Arc<RwLock<CacheStore>>,
    codec: CodecPipeline,
    dedup: DeduplicationRegister<T>,
    retry: RetryExecutor,
    metrics: Arc<CacheMetrics>,
    cleanup_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl<T> RequestCache<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates an engine from a validated configuration and starts the
    /// background sweep task.
    ///
    /// Returns `InvalidConfig` listing every violation when the
    /// configuration fails validation.
    pub fn new(config: RequestCacheConfig) -> Result<Self> {
        let violations = validate_config(&config);
        if !violations.is_empty() {
            return Err(CacheError::InvalidConfig(violations.join("; ")));
        }

        let metrics = Arc::new(CacheMetrics::new(config.enable_metrics));
        let store = Arc::new(RwLock::new(CacheStore::new(
            config.max_size,
            config.default_ttl,
            config.cache_strategy,
            metrics.clone(),
        )));
        let codec = CodecPipeline::new(
            config.enable_compression,
            config.enable_obfuscation,
            config.obfuscation_key.clone(),
        );
        let dedup = DeduplicationRegister::new(
            Duration::from_millis(config.deduplication_timeout),
            metrics.clone(),
        );
        let retry = RetryExecutor::new(config.retry.clone(), metrics.clone());
        let cleanup_handle = spawn_cleanup_task(
            store.clone(),
            Duration::from_millis(config.cleanup_interval),
        );

        Ok(Self {
            config,
            store,
            codec,
            dedup,
            retry,
            metrics,
            cleanup_handle: StdMutex::new(Some(cleanup_handle)),
        })
    }

    /// Creates an engine with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(RequestCacheConfig::default())
    }

    // == Get ==
    /// Returns the cached payload for `key`, or `None` on a miss (absent or
    /// expired entry, both removed and recorded as misses by the store).
    ///
    /// An entry whose stored form can no longer be decoded is dropped and
    /// treated as absent; decode fallbacks themselves are transparent.
    pub async fn get(&self, key: &str) -> Option<T> {
        let encoded = self.store.write().await.get(key).ok()?;

        match self.codec.decode::<T>(&encoded) {
            Ok(decoded) => {
                if decoded.passthrough && self.config.debug {
                    debug!(key, "payload decoded via plain-form fallback");
                }
                Some(decoded.value)
            }
            Err(err) => {
                warn!(key, error = %err, "stored payload undecodable, dropping entry");
                self.store.write().await.delete(key);
                None
            }
        }
    }

    // == Set ==
    /// Encodes and stores a payload with optional TTL in milliseconds.
    pub async fn set(&self, key: &str, value: &T, ttl: Option<i64>) -> Result<()> {
        let encoded = self.codec.encode(value)?;
        if encoded.passthrough && self.config.debug {
            debug!(key, "payload stored without codec transforms");
        }
        self.store
            .write()
            .await
            .set(key.to_string(), encoded.payload, ttl)
    }

    // == Delete ==
    /// Removes an entry; returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Has ==
    /// Presence check honoring expiry; no counter side effects.
    pub async fn has(&self, key: &str) -> bool {
        self.store.read().await.has(key)
    }

    // == Keys ==
    /// Keys of all non-expired entries.
    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    // == Length ==
    /// Current number of entries, swept or not.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Clear ==
    /// Removes every entry.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    // == Fetch ==
    /// The composed request path: cache, then deduplication, then the
    /// retry-wrapped fetch operation.
    ///
    /// On a cache miss, concurrent callers for the same key collapse onto
    /// one dispatch; the driving caller runs `fetcher` under the retry
    /// policy and stores the success before sharing it. Fetch errors reach
    /// the caller unchanged once retries are exhausted; storage problems
    /// are logged and never interrupt the data path.
    pub async fn fetch<F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        self.dedup
            .deduplicate(key, || async {
                let value = self.retry.execute(|| fetcher()).await?;
                if let Err(err) = self.set(key, &value, None).await {
                    warn!(key, error = %err, "fetched payload could not be cached");
                }
                Ok(value)
            })
            .await
    }

    // == Metrics ==
    /// Point-in-time copy of the engine counters.
    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    // == Diagnostics ==
    /// Derived statistics over the live entry set.
    pub async fn diagnostics(&self) -> CacheDiagnostics {
        self.store.read().await.diagnostics()
    }

    // == Optimize ==
    /// Immediate maintenance pass: sweeps expired entries and evicts down
    /// to capacity. A manually triggered version of the background sweep.
    pub async fn optimize(&self) -> OptimizeReport {
        let mut store = self.store.write().await;
        let (swept, swept_bytes) = store.cleanup_expired();
        let (evicted, evicted_bytes) = store.evict_over_capacity();

        OptimizeReport {
            removed_entries: swept + evicted,
            freed_bytes: swept_bytes + evicted_bytes,
        }
    }

    // == Export ==
    /// Serializes the entry set, metrics and configuration to JSON.
    pub async fn export(&self) -> Result<String> {
        let export = CacheExport {
            entries: self.store.read().await.entries_snapshot(),
            metrics: self.metrics.snapshot(),
            config: self.config.clone(),
        };
        serde_json::to_string(&export).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    // == Import ==
    /// Restores entries and metrics from an [`RequestCache::export`] payload.
    ///
    /// The payload is parsed and shape-checked in full before any state is
    /// replaced; malformed input returns `Import` and leaves the engine
    /// untouched. The instance keeps its own configuration and callbacks —
    /// the exported config travels for inspection, not for behavior.
    pub async fn import(&self, data: &str) -> Result<()> {
        let export: CacheExport =
            serde_json::from_str(data).map_err(|e| CacheError::Import(e.to_string()))?;

        for entry in &export.entries {
            if entry.key.is_empty() {
                return Err(CacheError::Import(
                    "entry with empty key in import payload".to_string(),
                ));
            }
        }

        self.store.write().await.replace_entries(export.entries);
        self.metrics.restore(&export.metrics);
        Ok(())
    }

    // == Shutdown ==
    /// Stops the background sweep task. Idempotent; call before discarding
    /// the engine.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.cleanup_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    // == Accessors ==
    /// The configuration this engine was built with.
    pub fn config(&self) -> &RequestCacheConfig {
        &self.config
    }

    /// Number of requests currently in flight in the dedup register.
    pub async fn in_flight_count(&self) -> usize {
        self.dedup.in_flight_count().await
    }
}

impl<T> Drop for RequestCache<T> {
    fn drop(&mut self) {
        // Same as shutdown(), minus the payload bounds Drop cannot carry.
        if let Ok(mut guard) = self.cleanup_handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
