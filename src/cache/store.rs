//! Cache Store Module
//!
//! Main entry store combining HashMap storage with TTL expiration and
//! strategy-driven eviction. The store holds encoded payloads as opaque
//! strings; the codec pipeline runs at the engine layer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{
    CacheDiagnostics, CacheEntry, CacheMetrics, EvictionStrategy, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Entry storage with TTL expiry and capacity-bounded eviction.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Victim selection strategy, fixed for the store's lifetime
    strategy: EvictionStrategy,
    /// Shared engine counters
    metrics: Arc<CacheMetrics>,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl: i64,
    /// Next insertion sequence number
    next_seq: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the store can hold
    /// * `default_ttl` - Default TTL in milliseconds for entries without explicit TTL
    /// * `strategy` - Eviction strategy applied when over capacity
    /// * `metrics` - Shared counters updated by every store operation
    pub fn new(
        max_size: usize,
        default_ttl: i64,
        strategy: EvictionStrategy,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            strategy,
            metrics,
            max_size,
            default_ttl,
            next_seq: 0,
        }
    }

    // == Set ==
    /// Stores an encoded payload with optional TTL.
    ///
    /// If the key already exists the entry is overwritten and its TTL,
    /// timestamp and sequence are reset. If the insert pushes the store over
    /// capacity, victims are evicted immediately afterwards.
    ///
    /// # Arguments
    /// * `key` - The fingerprint to store under
    /// * `data` - The encoded payload
    /// * `ttl` - Optional TTL in milliseconds (uses default_ttl if None)
    pub fn set(&mut self, key: String, data: String, ttl: Option<i64>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if data.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = CacheEntry::new(key.clone(), data, effective_ttl, seq);
        self.entries.insert(key, entry);
        self.metrics.record_set();

        self.evict_over_capacity();
        Ok(())
    }

    // == Get ==
    /// Retrieves the encoded payload for a key.
    ///
    /// Expired entries are removed as a side effect and counted as misses;
    /// hits bump the entry's hit count.
    pub fn get(&mut self, key: &str) -> Result<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.metrics.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        if expired {
            self.entries.remove(key);
            self.metrics.record_miss();
            return Err(CacheError::Expired(key.to_string()));
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.hit_count += 1;
                self.metrics.record_hit();
                Ok(entry.data.clone())
            }
            None => {
                self.metrics.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key; returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.metrics.record_delete();
            true
        } else {
            false
        }
    }

    // == Has ==
    /// Presence check honoring expiry. No counter side effects.
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Keys ==
    /// Returns the keys of all non-expired entries.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.key.clone())
            .collect()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Runs independently of `get`-triggered lazy expiry so that idle,
    /// unread entries are still reclaimed.
    ///
    /// Returns the number of entries removed and the bytes freed.
    pub fn cleanup_expired(&mut self) -> (usize, usize) {
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key.clone())
            .collect();

        let mut freed = 0;
        for key in &expired_keys {
            if let Some(entry) = self.entries.remove(key) {
                freed += entry.size;
            }
        }

        (expired_keys.len(), freed)
    }

    // == Evict Over Capacity ==
    /// Evicts victims until the entry count is within `max_size`.
    ///
    /// Never fails: a `max_size` of zero evicts down to empty. Evictions are
    /// counted separately from deletes.
    ///
    /// Returns the number of entries evicted and the bytes freed.
    pub fn evict_over_capacity(&mut self) -> (usize, usize) {
        if self.entries.len() <= self.max_size {
            return (0, 0);
        }

        let excess = self.entries.len() - self.max_size;
        let victims = self.strategy.select_victims(&self.entries, excess);

        let mut freed = 0;
        let mut removed = 0;
        for key in victims {
            if let Some(entry) = self.entries.remove(&key) {
                freed += entry.size;
                removed += 1;
                self.metrics.record_eviction();
            }
        }

        (removed, freed)
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Diagnostics ==
    /// Computes derived statistics over the live entry set.
    pub fn diagnostics(&self) -> CacheDiagnostics {
        let entry_count = self.entries.len();
        let total_size_bytes = self.entries.values().map(|e| e.size).sum();
        let total_hits: u64 = self.entries.values().map(|e| e.hit_count).sum();
        let average_hit_count = if entry_count == 0 {
            0.0
        } else {
            total_hits as f64 / entry_count as f64
        };

        CacheDiagnostics {
            entry_count,
            total_size_bytes,
            average_hit_count,
            oldest_entry_at: self.entries.values().map(|e| e.timestamp).min(),
            newest_entry_at: self.entries.values().map(|e| e.timestamp).max(),
            expired_pending_sweep: self.entries.values().filter(|e| e.is_expired()).count(),
            hit_rate: self.metrics.snapshot().hit_rate(),
        }
    }

    // == Export / Import Support ==
    /// Returns a copy of every entry, for export.
    pub fn entries_snapshot(&self) -> Vec<CacheEntry> {
        self.entries.values().cloned().collect()
    }

    /// Replaces the entry set wholesale, for import. The sequence counter is
    /// advanced past every imported entry so future inserts stay ordered.
    pub fn replace_entries(&mut self, entries: Vec<CacheEntry>) {
        self.next_seq = entries.iter().map(|e| e.seq + 1).max().unwrap_or(0);
        self.entries = entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        self.evict_over_capacity();
    }

    // == Metrics ==
    /// The shared counters this store records into.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn store(max_size: usize) -> CacheStore {
        CacheStore::new(
            max_size,
            300_000,
            EvictionStrategy::Lru,
            Arc::new(CacheMetrics::new(true)),
        )
    }

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        let value = store.get("key1").unwrap();

        assert_eq!(value, "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);

        let result = store.get("nonexistent");
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));

        assert!(store.is_empty());
        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        store.set("key1".to_string(), "value2".to_string(), None).unwrap();

        let value = store.get("key1").unwrap();
        assert_eq!(value, "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(60)).unwrap();
        assert!(store.get("key1").is_ok());

        sleep(Duration::from_millis(90));

        let result = store.get("key1");
        assert!(matches!(result, Err(CacheError::Expired(_))));
        // Expired entry is removed, not merely flagged.
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_zero_ttl_is_immediately_expired() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(0)).unwrap();
        assert!(matches!(store.get("key1"), Err(CacheError::Expired(_))));
    }

    #[test]
    fn test_store_negative_ttl_is_immediately_expired() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(-100)).unwrap();
        assert!(!store.has("key1"));
        assert!(matches!(store.get("key1"), Err(CacheError::Expired(_))));
    }

    #[test]
    fn test_store_has_does_not_touch_counters() {
        let mut store = store(100);
        store.set("key1".to_string(), "value1".to_string(), None).unwrap();

        assert!(store.has("key1"));
        assert!(!store.has("other"));

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
    }

    #[test]
    fn test_store_eviction_bound() {
        let mut store = store(3);

        for i in 0..10 {
            store.set(format!("key{}", i), "v".to_string(), None).unwrap();
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.metrics.snapshot().evictions, 7);
    }

    #[test]
    fn test_store_lru_evicts_oldest_set_time() {
        let mut store = store(3);

        store.set("key1".to_string(), "v".to_string(), None).unwrap();
        store.set("key2".to_string(), "v".to_string(), None).unwrap();
        store.set("key3".to_string(), "v".to_string(), None).unwrap();

        // Reads do not refresh the timestamp in this design, so key1 stays
        // the victim even after being read.
        store.get("key1").unwrap();

        store.set("key4".to_string(), "v".to_string(), None).unwrap();

        assert_eq!(store.len(), 3);
        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
        assert!(store.get("key2").is_ok());
    }

    #[test]
    fn test_store_lfu_evicts_least_hit() {
        let mut store = CacheStore::new(
            2,
            300_000,
            EvictionStrategy::Lfu,
            Arc::new(CacheMetrics::new(true)),
        );

        store.set("hot".to_string(), "v".to_string(), None).unwrap();
        store.set("cold".to_string(), "v".to_string(), None).unwrap();
        store.get("hot").unwrap();
        store.get("hot").unwrap();

        store.set("new".to_string(), "v".to_string(), None).unwrap();

        assert!(store.has("hot"));
        assert!(!store.has("cold"));
        assert!(store.has("new"));
    }

    #[test]
    fn test_store_zero_capacity_evicts_to_empty() {
        let mut store = store(0);

        store.set("key1".to_string(), "v".to_string(), None).unwrap();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = store(100);

        store.set("short".to_string(), "aa".to_string(), Some(30)).unwrap();
        store.set("long".to_string(), "bbbb".to_string(), Some(60_000)).unwrap();

        sleep(Duration::from_millis(60));

        let (removed, freed) = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(freed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").is_ok());
    }

    #[test]
    fn test_store_stats_consistency() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), None).unwrap();
        store.get("key1").unwrap(); // hit
        let _ = store.get("nonexistent"); // miss

        let snapshot = store.metrics.snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.sets, 1);
    }

    #[test]
    fn test_store_diagnostics() {
        let mut store = store(100);

        store.set("a".to_string(), "xx".to_string(), None).unwrap();
        store.set("b".to_string(), "yyyy".to_string(), None).unwrap();
        store.get("a").unwrap();

        let diag = store.diagnostics();
        assert_eq!(diag.entry_count, 2);
        assert_eq!(diag.total_size_bytes, 6);
        assert_eq!(diag.average_hit_count, 0.5);
        assert!(diag.oldest_entry_at.is_some());
        assert!(diag.oldest_entry_at <= diag.newest_entry_at);
        assert_eq!(diag.expired_pending_sweep, 0);
    }

    #[test]
    fn test_store_snapshot_and_replace() {
        let mut store = store(100);

        store.set("a".to_string(), "1".to_string(), None).unwrap();
        store.set("b".to_string(), "2".to_string(), None).unwrap();

        let snapshot = store.entries_snapshot();
        assert_eq!(snapshot.len(), 2);

        let mut other = CacheStore::new(
            100,
            300_000,
            EvictionStrategy::Lru,
            Arc::new(CacheMetrics::new(true)),
        );
        other.replace_entries(snapshot);

        assert_eq!(other.len(), 2);
        assert_eq!(other.get("a").unwrap(), "1");
        assert_eq!(other.get("b").unwrap(), "2");
    }

    #[test]
    fn test_store_key_too_long() {
        let mut store = store(100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.set(long_key, "value".to_string(), None);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_store_value_too_large() {
        let mut store = store(100);
        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);

        let result = store.set("key".to_string(), large_value, None);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
