//! Error types for the request cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Every variant is `Clone` so that a single failure can be broadcast
//! unchanged to every deduplicated waiter of the same request key.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the request cache engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key has expired
    #[error("Key expired: {0}")]
    Expired(String),

    /// Invalid request data (oversized key or payload)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// In-flight request did not settle before the deduplication timeout
    #[error("Request timed out after deduplication window: {0}")]
    DeduplicationTimeout(String),

    /// Cache import payload was malformed; existing state is untouched
    #[error("Import failed: {0}")]
    Import(String),

    /// Payload could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure reported by the caller-supplied fetch operation.
    ///
    /// `status` carries the upstream response status when one was received;
    /// `None` means the failure happened below the protocol level (DNS,
    /// connection reset, aborted transfer).
    #[error("Upstream failure{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (status {s})"),
        None => String::new(),
    }
}

impl CacheError {
    /// Shorthand for a network-level upstream failure with no status.
    pub fn transport(message: impl Into<String>) -> Self {
        CacheError::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for an upstream failure carrying a response status.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        CacheError::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the request cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
