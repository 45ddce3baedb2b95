//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

use crate::cache::{DEFAULT_MAX_ITEM_SIZE_BYTES, DEFAULT_MAX_SIZE_BYTES};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// At least one of `max_item_count` / `max_size_bytes` must be set for a
/// `BoundedCache` to be constructible from this config; the defaults satisfy
/// that with a byte-size cap.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether caching is enabled at all; disabled kinds get no-op connections
    pub enabled: bool,
    /// Maximum number of entries the cache can hold
    pub max_item_count: Option<usize>,
    /// Maximum aggregate byte size of all entries
    pub max_size_bytes: Option<usize>,
    /// Maximum byte size of a single entry; larger entries are rejected outright
    pub max_item_size_bytes: Option<usize>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Whether caching is enabled (default: true)
    /// - `CACHE_MAX_ITEMS` - Maximum cache entries (default: unset)
    /// - `CACHE_MAX_SIZE_BYTES` - Aggregate size cap in bytes (default: 16 MiB)
    /// - `CACHE_MAX_ITEM_SIZE_BYTES` - Per-entry size cap in bytes (default: 1 MiB)
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            max_item_count: env::var("CACHE_MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok()),
            max_size_bytes: Some(
                env::var("CACHE_MAX_SIZE_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_SIZE_BYTES),
            ),
            max_item_size_bytes: Some(
                env::var("CACHE_MAX_ITEM_SIZE_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_ITEM_SIZE_BYTES),
            ),
        }
    }

    /// Returns a copy of this config with caching disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_item_count: None,
            max_size_bytes: Some(DEFAULT_MAX_SIZE_BYTES),
            max_item_size_bytes: Some(DEFAULT_MAX_ITEM_SIZE_BYTES),
        }
    }
}
