//! recache - a bounded LRU cache with staleness-aware read-through connections
//!
//! Two layers, bottom-up:
//!
//! - [`BoundedCache`]: an in-memory key/value store enforcing a maximum entry
//!   count and/or aggregate byte size, evicting least-recently-used entries
//!   to make room.
//! - [`CacheKind`] / [`CacheConnection`]: a per-namespace façade that reads
//!   and writes through a shared `BoundedCache` and reconciles it against a
//!   backing store's incremental change feed, with TTL-bounded staleness and
//!   operational counters. Disabled kinds hand out [`NoopCacheConnection`]s.

pub mod cache;
pub mod config;
pub mod connection;
pub mod error;

pub use cache::{BoundedCache, EntrySize};
pub use config::CacheConfig;
pub use connection::{
    CacheConnection, CacheCounters, CacheEntry, CacheKind, CacheLookup, ChangeSource, Connection,
    CounterRegistry, NoopCacheConnection, CACHE_ENTRY_TTL_SEC,
};
pub use error::{CacheError, Result};
