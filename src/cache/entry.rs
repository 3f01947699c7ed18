//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cache entry holding an encoded payload and its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request fingerprint this entry is stored under
    pub key: String,
    /// Stored payload, post codec pipeline
    pub data: String,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Requested lifetime in milliseconds; zero or negative means already expired
    pub ttl: i64,
    /// Expiration instant; always `timestamp + ttl`
    pub expires: i64,
    /// Number of successful reads; drives LFU eviction
    pub hit_count: u64,
    /// Byte length of the stored (encoded) payload
    pub size: usize,
    /// Insertion sequence number; deterministic tie-break for eviction
    pub seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The fingerprint the entry is stored under
    /// * `data` - The encoded payload to store
    /// * `ttl_ms` - Lifetime in milliseconds; negative values make the entry
    ///   expired immediately, no clamping is applied
    /// * `seq` - Insertion sequence number assigned by the store
    pub fn new(key: String, data: String, ttl_ms: i64, seq: u64) -> Self {
        let now = current_timestamp_ms();
        let size = data.len();

        Self {
            key,
            expires: now as i64 + ttl_ms,
            timestamp: now,
            ttl: ttl_ms,
            hit_count: 0,
            size,
            data,
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired when the current time is
    /// greater than or equal to `expires`, so `ttl = 0` is expired on the
    /// very next check.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() as i64 >= self.expires
    }

    /// Returns remaining TTL in milliseconds, or 0 once expired.
    pub fn ttl_remaining_ms(&self) -> i64 {
        let now = current_timestamp_ms() as i64;
        if self.expires > now {
            self.expires - now
        } else {
            0
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
