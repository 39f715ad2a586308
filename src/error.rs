//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend variant name not present in the registry
    #[error("Unknown cache backend variant: {0}")]
    UnknownBackend(String),

    /// Backend configuration is missing a required parameter
    #[error("Invalid backend configuration: {0}")]
    Configuration(String),

    /// Cached value or key-list could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable store or key-list I/O failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
