//! Configuration Module
//!
//! Engine configuration with documented defaults and a pure validation
//! function. Configuration is immutable per engine instance: construct a
//! `RequestCacheConfig`, hand it to `RequestCache::new`, and the engine owns
//! it for its lifetime.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::EvictionStrategy;
use crate::error::CacheError;

// == Retry Callbacks ==
/// Predicate deciding whether a failed attempt should be retried.
pub type RetryCondition = Arc<dyn Fn(&CacheError) -> bool + Send + Sync>;

/// Observer invoked before each retry with the error and the upcoming
/// attempt number (1-based).
pub type OnRetry = Arc<dyn Fn(&CacheError, u32) + Send + Sync>;

/// Observer invoked once when all retry attempts are exhausted.
pub type OnMaxRetriesReached = Arc<dyn Fn(&CacheError) + Send + Sync>;

// == Retry Config ==
/// Retry policy for the retry executor.
#[derive(Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the initial one (default: 3)
    pub max_retries: u32,
    /// Base delay before the first retry, in milliseconds (default: 1000)
    pub retry_delay: u64,
    /// Exponential growth factor applied per retry (default: 2.0)
    pub retry_delay_multiplier: f64,
    /// Upper bound on any single backoff delay, in milliseconds (default: 30000)
    pub max_retry_delay: u64,
    /// Optional predicate; when absent the default predicate applies
    /// (retry network-level failures and 5xx statuses, never 4xx)
    #[serde(skip)]
    pub retry_condition: Option<RetryCondition>,
    /// Optional per-retry observer
    #[serde(skip)]
    pub on_retry: Option<OnRetry>,
    /// Optional exhaustion observer
    #[serde(skip)]
    pub on_max_retries_reached: Option<OnMaxRetriesReached>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: 1000,
            retry_delay_multiplier: 2.0,
            max_retry_delay: 30_000,
            retry_condition: None,
            on_retry: None,
            on_max_retries_reached: None,
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("retry_delay_multiplier", &self.retry_delay_multiplier)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("retry_condition", &self.retry_condition.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .field(
                "on_max_retries_reached",
                &self.on_max_retries_reached.is_some(),
            )
            .finish()
    }
}

// == Request Cache Config ==
/// Engine configuration parameters.
///
/// All values are optional at the call site via `..Default::default()` and
/// carry the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCacheConfig {
    /// Maximum number of entries the cache can hold (default: 1000)
    pub max_size: usize,
    /// Default TTL in milliseconds for entries without explicit TTL (default: 300000)
    pub default_ttl: i64,
    /// Background sweep interval in milliseconds (default: 60000, minimum: 1000)
    pub cleanup_interval: u64,
    /// Eviction strategy applied when over capacity (default: Lru)
    pub cache_strategy: EvictionStrategy,
    /// How long an in-flight request may stay unsettled before its shared
    /// result rejects, in milliseconds (default: 30000, minimum: 1000)
    pub deduplication_timeout: u64,
    /// Enable the key-aliasing compression step (default: false)
    pub enable_compression: bool,
    /// Enable the XOR/base64 obfuscation step (default: false).
    ///
    /// This is obfuscation only, not encryption: a repeating-key XOR with no
    /// integrity check. Do not rely on it for confidentiality.
    pub enable_obfuscation: bool,
    /// Key for the obfuscation step; required when `enable_obfuscation` is set
    pub obfuscation_key: Option<String>,
    /// Retry policy handed to the retry executor
    pub retry: RetryConfig,
    /// Emit debug-level traces for codec fallbacks and maintenance (default: false)
    pub debug: bool,
    /// Record metrics counters (default: true)
    pub enable_metrics: bool,
}

impl Default for RequestCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl: 300_000,
            cleanup_interval: 60_000,
            cache_strategy: EvictionStrategy::Lru,
            deduplication_timeout: 30_000,
            enable_compression: false,
            enable_obfuscation: false,
            obfuscation_key: None,
            retry: RetryConfig::default(),
            debug: false,
            enable_metrics: true,
        }
    }
}

// == Validation ==
/// Checks a candidate configuration against the documented minimums.
///
/// Returns a list of human-readable violations; an empty list means the
/// configuration is valid. Pure function, no side effects.
pub fn validate_config(config: &RequestCacheConfig) -> Vec<String> {
    let mut violations = Vec::new();

    if config.max_size < 1 {
        violations.push("max_size must be at least 1".to_string());
    }
    if config.default_ttl < 0 {
        violations.push("default_ttl must be at least 0".to_string());
    }
    if config.cleanup_interval < 1000 {
        violations.push("cleanup_interval must be at least 1000 ms".to_string());
    }
    if config.deduplication_timeout < 1000 {
        violations.push("deduplication_timeout must be at least 1000 ms".to_string());
    }
    if config.retry.retry_delay_multiplier < 1.0 {
        violations.push("retry.retry_delay_multiplier must be at least 1".to_string());
    }
    if config.enable_obfuscation
        && config
            .obfuscation_key
            .as_deref()
            .map_or(true, |key| key.is_empty())
    {
        violations.push("obfuscation_key is required when enable_obfuscation is set".to_string());
    }

    violations
}
