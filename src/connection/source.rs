//! Change Source Module
//!
//! The narrow interface a backing store exposes to the cache: an incremental
//! "changed since" query used to reconcile cached entries.

use std::collections::HashMap;

// == Change Source ==
/// Incremental change feed of an authoritative backing store.
///
/// The connection layer only ever asks one question: which records of this
/// kind were modified strictly after a given timestamp. The answer has no
/// upper time bound. Implementations backed by large stores should page
/// through results internally (cursor-style, fixed-size batches) rather than
/// materialize unbounded result sets in one call.
///
/// Note that a record deleted in the backing store produces no changed-since
/// row, so deletions are invisible to this feed; cached copies of deleted
/// records age out via TTL instead.
pub trait ChangeSource {
    /// Raw changed-record shape handed to
    /// [`CacheEntry::is_up_to_date`](super::CacheEntry::is_up_to_date).
    type Update;

    /// Returns every record modified strictly after `updated_after_ms`
    /// (Unix milliseconds), keyed by entry key.
    ///
    /// Failures propagate out of connection creation; no stale-but-usable
    /// connection is handed back on a failed query.
    fn changes_since(&self, updated_after_ms: u64) -> anyhow::Result<HashMap<String, Self::Update>>;

    /// Preload hook used when a namespace holds no cached entries at all.
    ///
    /// The default performs no preload.
    fn changes_when_empty(&self) -> anyhow::Result<HashMap<String, Self::Update>> {
        Ok(HashMap::new())
    }
}
