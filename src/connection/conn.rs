//! Cache Connection Module
//!
//! Binds a shared [`BoundedCache`] to a namespace, keeps it fresh against the
//! backing store's change feed, and provides counted, TTL-aware read/write
//! operations. A disabled kind yields a [`NoopCacheConnection`] so callers
//! can read through the cache unconditionally.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::cache::{BoundedCache, EntrySize};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

use super::{CacheCounters, CacheEntry, ChangeSource};

// == Key Naming ==
/// Key prefix shared by every entry of one kind in one namespace.
pub fn make_key_prefix(kind: &str, namespace: &str) -> String {
    format!("{}:{}", kind, namespace)
}

/// Fully namespaced cache key for one entry.
pub fn make_key(kind: &str, namespace: &str, entry_key: &str) -> String {
    format!("{}:{}", make_key_prefix(kind, namespace), entry_key)
}

// == Cache Lookup ==
/// Outcome of a connection-level lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// Nothing cached under the key (or the cached copy had expired)
    Miss,
    /// The key is cached as known absent in the backing store
    Negative,
    /// A live cached value
    Hit(T),
}

impl<T> CacheLookup<T> {
    /// True for a live hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// Unwraps a live hit into its value.
    pub fn into_value(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}

// == Cache Kind ==
/// Process-scoped cache state for one cached payload kind.
///
/// Owns the shared [`BoundedCache`] (none is built when the kind is
/// disabled), the kind's counter family and its backing-store change feed.
/// Connections borrow from it per namespace.
#[derive(Debug)]
pub struct CacheKind<E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    /// Kind name; first component of every cache key
    name: String,
    /// Shared store; None when the kind is disabled
    cache: Option<Mutex<BoundedCache<Option<E>>>>,
    /// Counter family for this kind
    counters: Arc<CacheCounters>,
    /// Backing store change feed
    source: S,
}

impl<E, S> CacheKind<E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    // == Constructor ==
    /// Creates a cache kind with its own counter family.
    pub fn new(name: impl Into<String>, config: &CacheConfig, source: S) -> Result<Self> {
        Self::with_counters(name, config, source, Arc::new(CacheCounters::new()))
    }

    /// Creates a cache kind counting into an injected (typically
    /// registry-owned) counter family.
    pub fn with_counters(
        name: impl Into<String>,
        config: &CacheConfig,
        source: S,
        counters: Arc<CacheCounters>,
    ) -> Result<Self> {
        let cache = if config.enabled {
            Some(Mutex::new(BoundedCache::from_config(config)?))
        } else {
            None
        };
        Ok(Self {
            name: name.into(),
            cache,
            counters,
            source,
        })
    }

    /// Kind name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this kind actually caches.
    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// This kind's counter family.
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// The backing-store change feed.
    pub fn source(&self) -> &S {
        &self.source
    }

    // == Connect ==
    /// Obtains a connection for a namespace.
    ///
    /// A disabled kind yields a no-op connection. Otherwise the connection
    /// is reconciled against the backing store before it is returned, so a
    /// fresh connection reflects only non-stale data. A failing backing
    /// store query fails the whole attempt; no partially reconciled
    /// connection is handed back.
    pub fn connect(&self, namespace: &str) -> Result<Connection<'_, E, S>> {
        let Some(cache) = &self.cache else {
            return Ok(Connection::Noop(NoopCacheConnection));
        };

        let connection = CacheConnection {
            name: &self.name,
            prefix: make_key_prefix(&self.name, namespace),
            cache,
            counters: &self.counters,
            source: &self.source,
        };
        let updates = connection.incremental_updates()?;
        connection.apply_updates(updates);
        Ok(Connection::Active(connection))
    }
}

// == Cache Connection ==
/// A per-namespace view over one kind's shared cache.
#[derive(Debug)]
pub struct CacheConnection<'a, E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    name: &'a str,
    prefix: String,
    cache: &'a Mutex<BoundedCache<Option<E>>>,
    counters: &'a CacheCounters,
    source: &'a S,
}

impl<'a, E, S> CacheConnection<'a, E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    fn key_for(&self, entry_key: &str) -> String {
        format!("{}:{}", self.prefix, entry_key)
    }

    fn lock_cache(&self) -> MutexGuard<'a, BoundedCache<Option<E>>> {
        // A panicked holder cannot leave a half-applied mutation behind, so
        // the poisoned state is safe to recover
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Incremental Updates ==
    /// Queries the backing store for records changed since the newest entry
    /// this namespace holds.
    ///
    /// An empty namespace delegates to the source's preload hook. Negative
    /// markers count as present but contribute epoch 0 to the watermark, as
    /// do entries without a recorded modification time.
    pub fn incremental_updates(&self) -> Result<HashMap<String, E::Update>> {
        let scan_prefix = format!("{}:", self.prefix);
        let (has_items, watermark) = {
            let cache = self.lock_cache();
            let mut has_items = false;
            let mut watermark = 0u64;
            for (key, value) in cache.iter() {
                if !key.starts_with(&scan_prefix) {
                    continue;
                }
                has_items = true;
                if let Some(entry) = value {
                    watermark = watermark.max(entry.updated_on_ms());
                }
            }
            (has_items, watermark)
        };

        if !has_items {
            debug!(kind = self.name, prefix = %self.prefix, "empty namespace, using preload hook");
            return self.source.changes_when_empty().map_err(CacheError::Source);
        }

        let updates = self
            .source
            .changes_since(watermark)
            .map_err(CacheError::Source)?;
        self.counters.add_updates(updates.len() as u64);
        debug!(
            kind = self.name,
            watermark,
            count = updates.len(),
            "fetched incremental updates"
        );
        Ok(updates)
    }

    // == Apply Updates ==
    /// Reconciles this namespace against a set of change-feed records,
    /// evicting entries that are stale, out of date, or expired.
    ///
    /// Backing-store deletions never appear in the feed; deleted objects are
    /// served until their TTL elapses.
    pub fn apply_updates(&self, updates: HashMap<String, E::Update>) {
        enum Verdict {
            NotFound,
            Stale,
            Expired,
            Fresh,
        }

        self.counters.record_resync();

        let mut evicted = 0usize;
        let mut expired = 0usize;
        let mut cache = self.lock_cache();
        for (key, update) in updates {
            let cache_key = self.key_for(&key);
            let verdict = match cache.peek(&cache_key) {
                None => Verdict::NotFound,
                // A cached negative marker is stale on any upstream change
                Some(None) => Verdict::Stale,
                Some(Some(entry)) if !entry.is_up_to_date(&key, &update) => Verdict::Stale,
                Some(Some(entry)) if entry.has_expired() => Verdict::Expired,
                Some(Some(_)) => Verdict::Fresh,
            };
            match verdict {
                Verdict::NotFound => self.counters.record_not_found(),
                Verdict::Stale => {
                    self.counters.record_eviction();
                    let _ = cache.delete(&cache_key);
                    evicted += 1;
                }
                Verdict::Expired => {
                    self.counters.record_expiration();
                    let _ = cache.delete(&cache_key);
                    expired += 1;
                }
                Verdict::Fresh => {}
            }
        }

        if evicted > 0 || expired > 0 {
            info!(
                kind = self.name,
                evicted, expired, "resync dropped stale entries"
            );
        } else {
            debug!(kind = self.name, "resync found nothing stale");
        }
    }

    // == Get ==
    /// Looks up an entry by its (unnamespaced) key.
    ///
    /// An expired hit is reported as a miss and the entry dropped on the
    /// way out, so TTL holds at read time regardless of reconciliation.
    pub fn get(&self, key: &str) -> Result<CacheLookup<E::External>> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.counters.record_get();

        let cache_key = self.key_for(key);
        let mut cache = self.lock_cache();
        match cache.get(&cache_key)? {
            None => {
                self.counters.record_miss();
                return Ok(CacheLookup::Miss);
            }
            Some(None) => {
                self.counters.record_hit_none();
                return Ok(CacheLookup::Negative);
            }
            Some(Some(entry)) => {
                if !entry.has_expired() {
                    self.counters.record_hit();
                    return Ok(CacheLookup::Hit(entry.externalize(key)));
                }
            }
        }

        // Expired hit
        cache.delete(&cache_key)?;
        self.counters.record_expiration();
        Ok(CacheLookup::Miss)
    }

    // == Put ==
    /// Caches a value under its (unnamespaced) key.
    ///
    /// Write-and-forget: a rejected admission (oversized entry, pathological
    /// capacity) just means the value is not cached.
    pub fn put(&self, key: &str, external: E::External) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.counters.record_put();

        let entry = E::internalize(key, external);
        let mut cache = self.lock_cache();
        cache.put(&self.key_for(key), Some(entry))?;
        Ok(())
    }

    /// Caches a "known absent" marker so repeated lookups of a missing
    /// object skip the backing store.
    pub fn put_absent(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.counters.record_put();

        let mut cache = self.lock_cache();
        cache.put(&self.key_for(key), None)?;
        Ok(())
    }

    // == Delete ==
    /// Drops an entry; returns whether it was cached.
    pub fn delete(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.counters.record_delete();

        let mut cache = self.lock_cache();
        cache.delete(&self.key_for(key))
    }
}

// == Noop Cache Connection ==
/// Drop-in substitute used when caching is disabled for a kind.
///
/// `get` always misses and writes go nowhere, so calling code reads through
/// the cache without branching on whether caching is active.
#[derive(Debug, Default)]
pub struct NoopCacheConnection;

impl NoopCacheConnection {
    pub fn get<T>(&self, _key: &str) -> CacheLookup<T> {
        CacheLookup::Miss
    }

    pub fn put<T>(&self, _key: &str, _value: T) {}

    pub fn put_absent(&self, _key: &str) {}

    pub fn delete(&self, _key: &str) -> bool {
        false
    }
}

// == Connection ==
/// Either a live namespaced connection or the no-op variant.
#[derive(Debug)]
pub enum Connection<'a, E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    Active(CacheConnection<'a, E, S>),
    Noop(NoopCacheConnection),
}

impl<'a, E, S> Connection<'a, E, S>
where
    E: CacheEntry + EntrySize,
    S: ChangeSource<Update = E::Update>,
{
    /// True when this connection performs no caching.
    pub fn is_noop(&self) -> bool {
        matches!(self, Connection::Noop(_))
    }

    /// Looks up an entry; see [`CacheConnection::get`].
    pub fn get(&self, key: &str) -> Result<CacheLookup<E::External>> {
        match self {
            Connection::Active(conn) => conn.get(key),
            Connection::Noop(noop) => Ok(noop.get(key)),
        }
    }

    /// Caches a value; see [`CacheConnection::put`].
    pub fn put(&self, key: &str, external: E::External) -> Result<()> {
        match self {
            Connection::Active(conn) => conn.put(key, external),
            Connection::Noop(noop) => {
                noop.put(key, external);
                Ok(())
            }
        }
    }

    /// Caches a "known absent" marker; see [`CacheConnection::put_absent`].
    pub fn put_absent(&self, key: &str) -> Result<()> {
        match self {
            Connection::Active(conn) => conn.put_absent(key),
            Connection::Noop(noop) => {
                noop.put_absent(key);
                Ok(())
            }
        }
    }

    /// Drops an entry; see [`CacheConnection::delete`].
    pub fn delete(&self, key: &str) -> Result<bool> {
        match self {
            Connection::Active(conn) => conn.delete(key),
            Connection::Noop(noop) => Ok(noop.delete(key)),
        }
    }
}
