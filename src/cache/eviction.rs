//! Eviction Policy Module
//!
//! Selects victims when the store exceeds its capacity bound. The strategy
//! is chosen once in configuration and applied for the engine's lifetime.
//!
//! Note on LRU: victims are ranked by entry `timestamp`, which is the
//! set-time and is not refreshed on reads. This preserves the engine's
//! observed behavior; it is closer to oldest-write-first than to a
//! conventional read-tracking LRU.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;

// == Eviction Strategy ==
/// Victim selection strategy for capacity-driven eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Oldest set-time first
    Lru,
    /// Insertion order, oldest first
    Fifo,
    /// Smallest hit count first
    Lfu,
}

impl EvictionStrategy {
    // == Select Victims ==
    /// Picks up to `count` victim keys from `entries`.
    ///
    /// Ties are broken by the entry sequence number, so selection is
    /// deterministic for a given store state. Never fails; asking for more
    /// victims than there are entries returns every key.
    pub fn select_victims(&self, entries: &HashMap<String, CacheEntry>, count: usize) -> Vec<String> {
        if count == 0 || entries.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<&CacheEntry> = entries.values().collect();
        match self {
            EvictionStrategy::Lru => ranked.sort_by_key(|e| (e.timestamp, e.seq)),
            EvictionStrategy::Fifo => ranked.sort_by_key(|e| e.seq),
            EvictionStrategy::Lfu => ranked.sort_by_key(|e| (e.hit_count, e.seq)),
        }

        ranked
            .into_iter()
            .take(count)
            .map(|e| e.key.clone())
            .collect()
    }
}
