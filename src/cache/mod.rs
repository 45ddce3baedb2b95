//! Cache Module
//!
//! Provides the bounded in-memory store with LRU eviction.

mod lru;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use lru::LruTracker;
pub use store::{BoundedCache, EntrySize};

// == Public Constants ==
/// Default aggregate size cap in bytes
pub const DEFAULT_MAX_SIZE_BYTES: usize = 16 * 1024 * 1024; // 16 MiB

/// Default per-entry size cap in bytes
pub const DEFAULT_MAX_ITEM_SIZE_BYTES: usize = 1024 * 1024; // 1 MiB
