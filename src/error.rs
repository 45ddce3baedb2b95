//! Error types for the cache subsystem
//!
//! Provides unified error handling using thiserror.
//!
//! Capacity exhaustion and cache misses are deliberately *not* errors: they
//! are ordinary outcomes reported through return values. Only misconfiguration,
//! malformed keys and backing-store failures surface here.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A cache operation was called with an empty key
    #[error("cache key must not be empty")]
    EmptyKey,

    /// A BoundedCache was constructed with no capacity limit at all
    #[error("at least one of max_item_count or max_size_bytes must be set")]
    NoLimits,

    /// A capacity limit was provided but is not strictly positive
    #[error("{0} must be greater than zero")]
    InvalidLimit(&'static str),

    /// The backing store failed while serving a reconciliation query
    #[error("backing store query failed: {0}")]
    Source(#[source] anyhow::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
