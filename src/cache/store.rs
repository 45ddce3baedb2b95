//! Bounded Cache Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and
//! dual capacity policies (entry count and aggregate byte size).

use std::collections::HashMap;

use tracing::debug;

use crate::cache::LruTracker;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Entry Size ==
/// Byte-size cost of a cached value.
///
/// The store charges `key.len() + value.size_bytes()` per entry. Payload
/// kinds that know their real cost (for example a compressed blob) implement
/// this to report it.
pub trait EntrySize {
    /// Returns the byte footprint of this value.
    fn size_bytes(&self) -> usize;
}

impl EntrySize for String {
    fn size_bytes(&self) -> usize {
        self.len()
    }
}

impl EntrySize for Vec<u8> {
    fn size_bytes(&self) -> usize {
        self.len()
    }
}

/// A `None` is the "known absent" marker; it costs nothing beyond its key.
impl<T: EntrySize> EntrySize for Option<T> {
    fn size_bytes(&self) -> usize {
        match self {
            Some(value) => value.size_bytes(),
            None => 0,
        }
    }
}

// == Bounded Cache ==
/// Key/value store with LRU eviction and configurable capacity limits.
///
/// At least one of `max_item_count` / `max_size_bytes` must be set; both may
/// be set, in which case both are enforced. An optional `max_item_size_bytes`
/// rejects oversized entries outright without evicting anything on their
/// behalf.
///
/// Capacity violations are not errors: `put` returns `Ok(false)` when an
/// entry cannot be admitted. Only empty keys and misconfiguration raise.
#[derive(Debug)]
pub struct BoundedCache<V: EntrySize> {
    /// Key-value storage
    entries: HashMap<String, V>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_item_count: Option<usize>,
    /// Maximum aggregate byte size of all entries
    max_size_bytes: Option<usize>,
    /// Maximum byte size of a single entry
    max_item_size_bytes: Option<usize>,
    /// Running total of entry sizes; only maintained when max_size_bytes is set
    total_size: usize,
}

impl<V: EntrySize> BoundedCache<V> {
    // == Constructor ==
    /// Creates a new BoundedCache with the given capacity limits.
    ///
    /// # Errors
    /// - [`CacheError::NoLimits`] if neither count nor size cap is provided
    /// - [`CacheError::InvalidLimit`] if any provided cap is zero
    pub fn new(
        max_item_count: Option<usize>,
        max_size_bytes: Option<usize>,
        max_item_size_bytes: Option<usize>,
    ) -> Result<Self> {
        if max_item_count.is_none() && max_size_bytes.is_none() {
            return Err(CacheError::NoLimits);
        }
        if max_item_count == Some(0) {
            return Err(CacheError::InvalidLimit("max_item_count"));
        }
        if max_size_bytes == Some(0) {
            return Err(CacheError::InvalidLimit("max_size_bytes"));
        }
        if max_item_size_bytes == Some(0) {
            return Err(CacheError::InvalidLimit("max_item_size_bytes"));
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_item_count,
            max_size_bytes,
            max_item_size_bytes,
            total_size: 0,
        })
    }

    /// Creates a new BoundedCache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(
            config.max_item_count,
            config.max_size_bytes,
            config.max_item_size_bytes,
        )
    }

    // == Entry Size ==
    /// Byte cost charged for an entry: key length plus value size.
    pub fn entry_size(&self, key: &str, value: &V) -> usize {
        key.len() + value.size_bytes()
    }

    // == Contains ==
    /// Checks whether a key is present.
    ///
    /// Does not alter recency order.
    pub fn contains(&self, key: &str) -> Result<bool> {
        require_key(key)?;
        Ok(self.entries.contains_key(key))
    }

    // == Peek ==
    /// Looks up a value without promoting it in recency order.
    ///
    /// Reconciliation scans use this so inspecting an entry does not shield
    /// it from eviction. Absent and empty keys both report nothing.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most recently used.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get(&mut self, key: &str) -> Result<Option<&V>> {
        require_key(key)?;
        if self.entries.contains_key(key) {
            self.lru.touch(key);
        }
        Ok(self.entries.get(key))
    }

    // == Put ==
    /// Attempts to store a key-value pair.
    ///
    /// Returns `Ok(true)` when the entry was admitted (it is then the most
    /// recently used entry) and `Ok(false)` when it could not be:
    /// - its own size exceeds `max_item_size_bytes`, or
    /// - the size cap is set and the entry alone is at least as large as the
    ///   whole budget, or
    /// - evicting every other entry still cannot make room.
    ///
    /// Nothing is evicted on behalf of a rejected entry. Overwriting an
    /// existing key releases the old entry before admission so size
    /// accounting stays exact.
    pub fn put(&mut self, key: &str, value: V) -> Result<bool> {
        require_key(key)?;
        let entry_size = self.entry_size(key, &value);

        // Flatly disallowed entries never trigger eviction
        if let Some(cap) = self.max_item_size_bytes {
            if entry_size > cap {
                debug!(key, entry_size, cap, "entry exceeds per-item size cap, rejected");
                return Ok(false);
            }
        }
        // An entry at least as large as the whole size budget can never be
        // admitted; rejecting here keeps the eviction loop from draining the
        // cache for a doomed entry.
        if let Some(cap) = self.max_size_bytes {
            if entry_size >= cap {
                debug!(key, entry_size, cap, "entry exceeds total size cap, rejected");
                return Ok(false);
            }
        }

        self.remove_entry(key);

        if !self.allocate_space(entry_size) {
            return Ok(false);
        }

        if self.max_size_bytes.is_some() {
            self.total_size += entry_size;
        }
        self.entries.insert(key.to_string(), value);
        self.lru.touch(key);
        Ok(true)
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns whether the entry was present; deleting an absent key is a
    /// no-op.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        require_key(key)?;
        Ok(self.remove_entry(key))
    }

    // == Allocate Space ==
    /// Evicts least recently used entries until the configured limits admit
    /// one more entry of `entry_size` bytes.
    ///
    /// Returns false when the cache is empty and the limits are still
    /// violated.
    fn allocate_space(&mut self, entry_size: usize) -> bool {
        loop {
            let over_count = self
                .max_item_count
                .is_some_and(|cap| self.entries.len() >= cap);
            let over_size = self
                .max_size_bytes
                .is_some_and(|cap| self.total_size + entry_size >= cap);

            if !over_count && !over_size {
                return true;
            }

            match self.lru.pop_oldest() {
                Some(victim) => {
                    if let Some(evicted) = self.entries.remove(&victim) {
                        if self.max_size_bytes.is_some() {
                            self.total_size -= self.entry_size(&victim, &evicted);
                        }
                        debug!(key = %victim, "evicted least recently used entry");
                    }
                }
                None => return false,
            }
        }
    }

    // == Remove Entry ==
    /// Removes an entry and its bookkeeping; returns whether it existed.
    fn remove_entry(&mut self, key: &str) -> bool {
        if let Some(value) = self.entries.remove(key) {
            if self.max_size_bytes.is_some() {
                self.total_size -= self.entry_size(key, &value);
            }
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Iter ==
    /// Iterates over all entries in no particular order.
    ///
    /// Iteration does not alter recency order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Total Size ==
    /// Returns the aggregate byte size of current entries.
    ///
    /// Only maintained when `max_size_bytes` is set; zero otherwise.
    pub fn total_size_bytes(&self) -> usize {
        self.total_size
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        Err(CacheError::EmptyKey)
    } else {
        Ok(())
    }
}
