//! Cache Module
//!
//! Entry storage with TTL expiration, pluggable eviction, the optional
//! codec pipeline and the engine metrics.

mod codec;
mod entry;
mod eviction;
mod metrics;
mod store;


// Re-export public types
pub use codec::{CodecPipeline, Decoded, Encoded};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use eviction::EvictionStrategy;
pub use metrics::{CacheDiagnostics, CacheMetrics, MetricsSnapshot, OptimizeReport};
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes. Request fingerprints are base64 of
/// a canonical JSON document, so keys run longer than plain cache names.
pub const MAX_KEY_LENGTH: usize = 2048;

/// Maximum allowed stored payload size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
