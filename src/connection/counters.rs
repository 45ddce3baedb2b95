//! Cache Counters Module
//!
//! Operational counters for one cache kind. Purely observational: nothing in
//! the cache's behavior depends on them, and they cost one relaxed atomic
//! increment per event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

// == Cache Counters ==
/// Monotonic operational counters for one cache kind.
///
/// Counters use relaxed atomics so a kind shared across threads can count
/// behind `&self`.
#[derive(Debug, Default)]
pub struct CacheCounters {
    /// Values stored through a connection
    puts: AtomicU64,
    /// Lookups through a connection
    gets: AtomicU64,
    /// Deletes through a connection
    deletes: AtomicU64,
    /// Lookups that found a live entry
    hits: AtomicU64,
    /// Lookups that found a cached "known absent" marker
    hit_nones: AtomicU64,
    /// Lookups that found nothing
    misses: AtomicU64,
    /// Change-feed records with no local entry to reconcile
    not_founds: AtomicU64,
    /// Records returned by incremental reconciliation queries
    updates: AtomicU64,
    /// Entries evicted by reconciliation as stale or out of date
    evictions: AtomicU64,
    /// Entries dropped because their TTL elapsed
    expirations: AtomicU64,
    /// Reconciliation passes applied
    resyncs: AtomicU64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates a new counter family with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Recorders ==
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit_none(&self) {
        self.hit_nones.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_founds.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the number of records returned by one reconciliation query.
    pub fn add_updates(&self, count: u64) {
        self.updates.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns a point-in-time copy of all counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            hit_nones: self.hit_nones.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            not_founds: self.not_founds.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// == Counter Snapshot ==
/// Serializable point-in-time view of a [`CacheCounters`] family.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSnapshot {
    pub puts: u64,
    pub gets: u64,
    pub deletes: u64,
    pub hits: u64,
    pub hit_nones: u64,
    pub misses: u64,
    pub not_founds: u64,
    pub updates: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub resyncs: u64,
    /// RFC 3339 timestamp of when the snapshot was taken
    pub captured_at: String,
}

impl CounterSnapshot {
    // == Hit Rate ==
    /// Fraction of lookups answered from cache (live hits plus negative
    /// hits), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            (self.hits + self.hit_nones) as f64 / self.gets as f64
        }
    }
}

// == Counter Registry ==
/// Process-wide map from cache kind name to its shared counter family.
///
/// Injectable rather than global: hosts create one registry and hand it to
/// each kind, and tests instantiate isolated registries.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    by_kind: Mutex<HashMap<String, Arc<CacheCounters>>>,
}

impl CounterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter family for a kind, creating it on first use.
    pub fn for_kind(&self, name: &str) -> Arc<CacheCounters> {
        let mut by_kind = self
            .by_kind
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            by_kind
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(CacheCounters::new())),
        )
    }

    /// Snapshots every registered kind.
    pub fn snapshot_all(&self) -> HashMap<String, CounterSnapshot> {
        let by_kind = self
            .by_kind
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        by_kind
            .iter()
            .map(|(name, counters)| (name.clone(), counters.snapshot()))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let snapshot = CacheCounters::new().snapshot();
        assert_eq!(snapshot.puts, 0);
        assert_eq!(snapshot.gets, 0);
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
        assert_eq!(snapshot.resyncs, 0);
    }

    #[test]
    fn test_recorders_increment() {
        let counters = CacheCounters::new();
        counters.record_put();
        counters.record_get();
        counters.record_get();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.record_expiration();
        counters.record_resync();
        counters.add_updates(3);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.puts, 1);
        assert_eq!(snapshot.gets, 2);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.expirations, 1);
        assert_eq!(snapshot.resyncs, 1);
        assert_eq!(snapshot.updates, 3);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        let snapshot = CacheCounters::new().snapshot();
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_negative_hits() {
        let counters = CacheCounters::new();
        counters.record_get();
        counters.record_hit();
        counters.record_get();
        counters.record_hit_none();
        counters.record_get();
        counters.record_miss();
        counters.record_get();
        counters.record_expiration();

        assert_eq!(counters.snapshot().hit_rate(), 0.5);
    }

    #[test]
    fn test_registry_returns_same_family() {
        let registry = CounterRegistry::new();
        let a = registry.for_kind("Course");
        let b = registry.for_kind("Course");

        a.record_put();
        assert_eq!(b.snapshot().puts, 1);

        let other = registry.for_kind("Lesson");
        assert_eq!(other.snapshot().puts, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let counters = CacheCounters::new();
        counters.record_put();

        let json = serde_json::to_value(counters.snapshot()).unwrap();
        assert_eq!(json["puts"], 1);
        assert!(json["captured_at"].is_string());
    }

    #[test]
    fn test_snapshot_all() {
        let registry = CounterRegistry::new();
        registry.for_kind("Course").record_get();
        registry.for_kind("Lesson").record_put();

        let all = registry.snapshot_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["Course"].gets, 1);
        assert_eq!(all["Lesson"].puts, 1);
    }
}
