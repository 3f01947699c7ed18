//! Request Cache - a client-side request caching engine
//!
//! Sits between application code and a network transport: caches response
//! payloads by request fingerprint with TTL expiry and pluggable eviction,
//! collapses concurrent identical in-flight requests into one shared
//! result, and retries failed requests with exponential backoff.

pub mod cache;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod key;
pub mod retry;
pub mod tasks;

pub use cache::{
    CacheDiagnostics, CacheMetrics, CodecPipeline, Decoded, Encoded, EvictionStrategy,
    MetricsSnapshot, OptimizeReport,
};
pub use config::{validate_config, RequestCacheConfig, RetryConfig};
pub use dedup::DeduplicationRegister;
pub use engine::RequestCache;
pub use error::{CacheError, Result};
pub use key::request_key;
pub use retry::{default_retry_predicate, RetryExecutor};
