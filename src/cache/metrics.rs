//! Metrics & Diagnostics Module
//!
//! Aggregated engine counters. The counters are plain atomics updated with
//! relaxed ordering: every subsystem (store, deduplication register, retry
//! executor) shares one `Arc<CacheMetrics>` and increments without locking,
//! which keeps the hot path free of contention.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};

use serde::{Deserialize, Serialize};

// == Cache Metrics ==
/// Process-wide counters for one engine instance.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    enabled: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    dedup_hits: AtomicU64,
    retry_attempts: AtomicU64,
    retry_successes: AtomicU64,
    retry_failures: AtomicU64,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a metrics collector; `enabled = false` turns every record
    /// call into a no-op while keeping snapshots readable.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            ..Default::default()
        }
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.enabled.load(Relaxed) {
            counter.fetch_add(1, Relaxed);
        }
    }

    // == Recorders ==
    pub fn record_hit(&self) {
        self.bump(&self.hits);
    }

    pub fn record_miss(&self) {
        self.bump(&self.misses);
    }

    pub fn record_set(&self) {
        self.bump(&self.sets);
    }

    pub fn record_delete(&self) {
        self.bump(&self.deletes);
    }

    pub fn record_eviction(&self) {
        self.bump(&self.evictions);
    }

    pub fn record_dedup_hit(&self) {
        self.bump(&self.dedup_hits);
    }

    pub fn record_retry_attempt(&self) {
        self.bump(&self.retry_attempts);
    }

    pub fn record_retry_success(&self) {
        self.bump(&self.retry_successes);
    }

    pub fn record_retry_failure(&self) {
        self.bump(&self.retry_failures);
    }

    // == Snapshot ==
    /// Returns a consistent-enough point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Relaxed),
            misses: self.misses.load(Relaxed),
            sets: self.sets.load(Relaxed),
            deletes: self.deletes.load(Relaxed),
            evictions: self.evictions.load(Relaxed),
            dedup_hits: self.dedup_hits.load(Relaxed),
            retry_attempts: self.retry_attempts.load(Relaxed),
            retry_successes: self.retry_successes.load(Relaxed),
            retry_failures: self.retry_failures.load(Relaxed),
        }
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&self) {
        self.hits.store(0, Relaxed);
        self.misses.store(0, Relaxed);
        self.sets.store(0, Relaxed);
        self.deletes.store(0, Relaxed);
        self.evictions.store(0, Relaxed);
        self.dedup_hits.store(0, Relaxed);
        self.retry_attempts.store(0, Relaxed);
        self.retry_successes.store(0, Relaxed);
        self.retry_failures.store(0, Relaxed);
    }

    // == Restore ==
    /// Overwrites every counter from a snapshot (used by import).
    pub fn restore(&self, snapshot: &MetricsSnapshot) {
        self.hits.store(snapshot.hits, Relaxed);
        self.misses.store(snapshot.misses, Relaxed);
        self.sets.store(snapshot.sets, Relaxed);
        self.deletes.store(snapshot.deletes, Relaxed);
        self.evictions.store(snapshot.evictions, Relaxed);
        self.dedup_hits.store(snapshot.dedup_hits, Relaxed);
        self.retry_attempts.store(snapshot.retry_attempts, Relaxed);
        self.retry_successes.store(snapshot.retry_successes, Relaxed);
        self.retry_failures.store(snapshot.retry_failures, Relaxed);
    }
}

// == Metrics Snapshot ==
/// Read-only copy of the counters, serializable for export and inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub dedup_hits: u64,
    pub retry_attempts: u64,
    pub retry_successes: u64,
    pub retry_failures: u64,
}

impl MetricsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Diagnostics ==
/// Derived statistics computed over the live entry set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheDiagnostics {
    /// Current number of entries
    pub entry_count: usize,
    /// Sum of stored payload sizes in bytes
    pub total_size_bytes: usize,
    /// Mean hit count across entries, 0.0 when empty
    pub average_hit_count: f64,
    /// Set-time of the oldest entry (Unix ms), if any
    pub oldest_entry_at: Option<u64>,
    /// Set-time of the newest entry (Unix ms), if any
    pub newest_entry_at: Option<u64>,
    /// Entries already expired but not yet swept
    pub expired_pending_sweep: usize,
    /// Hit rate from the metrics counters
    pub hit_rate: f64,
}

// == Optimize Report ==
/// Outcome of a manually triggered maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizeReport {
    /// Entries removed by the sweep and the capacity check
    pub removed_entries: usize,
    /// Bytes of stored payload freed
    pub freed_bytes: usize,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = CacheMetrics::new(true);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_recording() {
        let metrics = CacheMetrics::new(true);
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_set();
        metrics.record_eviction();
        metrics.record_dedup_hit();
        metrics.record_retry_attempt();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.sets, 1);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.dedup_hits, 1);
        assert_eq!(snapshot.retry_attempts, 1);
    }

    #[test]
    fn test_disabled_metrics_record_nothing() {
        let metrics = CacheMetrics::new(false);
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_reset() {
        let metrics = CacheMetrics::new(true);
        metrics.record_hit();
        metrics.record_retry_failure();
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_restore() {
        let metrics = CacheMetrics::new(true);
        let snapshot = MetricsSnapshot {
            hits: 10,
            misses: 5,
            ..Default::default()
        };
        metrics.restore(&snapshot);
        assert_eq!(metrics.snapshot(), snapshot);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(MetricsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let snapshot = MetricsSnapshot {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.hit_rate(), 0.75);
    }
}
