//! Connection Module
//!
//! Namespaced, read-through cache connections that reconcile a shared
//! [`BoundedCache`](crate::cache::BoundedCache) against a backing store's
//! incremental change feed.

mod conn;
mod counters;
mod entry;
mod source;

// Re-export public types
pub use conn::{
    make_key, make_key_prefix, CacheConnection, CacheKind, CacheLookup, Connection,
    NoopCacheConnection,
};
pub use counters::{CacheCounters, CounterRegistry, CounterSnapshot};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use source::ChangeSource;

// == Public Constants ==
/// Absolute ceiling, in seconds, on how long a deleted-but-not-yet-known-deleted
/// entry may linger. Reconciliation cannot observe backing-store deletions, so
/// this TTL bounds their staleness.
pub const CACHE_ENTRY_TTL_SEC: u64 = 300;
