//! Cache Entry Module
//!
//! Defines the contract cached payload kinds implement so connections can
//! convert, age and reconcile their entries.

use std::time::{SystemTime, UNIX_EPOCH};

use super::CACHE_ENTRY_TTL_SEC;

// == Cache Entry ==
/// A cached wrapper around one payload kind.
///
/// Each payload kind supplies its own implementation: how the externally
/// visible shape converts to and from the cached shape, and how a record
/// from the backing store's change feed relates to a cached entry. The
/// store and connections never see concrete kinds.
pub trait CacheEntry: Sized {
    /// Externally visible shape of the cached object.
    type External;
    /// Raw changed-record shape from the backing store's change feed.
    type Update;

    /// Converts the external shape into the cached wrapper.
    ///
    /// Implementations stamp the entry with the current time so TTL
    /// expiration starts at insertion.
    fn internalize(key: &str, external: Self::External) -> Self;

    /// Converts the cached wrapper back to the external shape.
    fn externalize(&self, key: &str) -> Self::External;

    /// Timestamp (Unix milliseconds) at which this entry was cached.
    fn created_on_ms(&self) -> u64;

    /// Last-modification timestamp (Unix milliseconds) of the underlying
    /// real-world object; drives incremental reconciliation queries.
    ///
    /// Legacy entries without a recorded modification time report 0.
    fn updated_on_ms(&self) -> u64 {
        0
    }

    /// Decides whether a change-feed record still matches this entry.
    ///
    /// Returning false means the object changed upstream and the cached
    /// copy must be evicted.
    fn is_up_to_date(&self, key: &str, update: &Self::Update) -> bool;

    /// Checks whether this entry has outlived [`CACHE_ENTRY_TTL_SEC`].
    fn has_expired(&self) -> bool {
        current_timestamp_ms().saturating_sub(self.created_on_ms()) > CACHE_ENTRY_TTL_SEC * 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
