//! Property-Based Tests for the Bounded Cache
//!
//! Uses proptest to verify the capacity and recency invariants.

use proptest::prelude::*;

use crate::cache::BoundedCache;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

/// Generates valid cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,128}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn apply(cache: &mut BoundedCache<String>, op: CacheOp) {
    match op {
        CacheOp::Put { key, value } => {
            let _ = cache.put(&key, value).unwrap();
        }
        CacheOp::Get { key } => {
            let _ = cache.get(&key).unwrap();
        }
        CacheOp::Delete { key } => {
            let _ = cache.delete(&key).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any operation sequence under a count cap of N, the cache never
    // holds more than N entries.
    #[test]
    fn prop_count_cap_never_exceeded(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let max_items = 10;
        let mut cache = BoundedCache::new(Some(max_items), None, None).unwrap();

        for op in ops {
            apply(&mut cache, op);
            prop_assert!(
                cache.len() <= max_items,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_items
            );
        }
    }

    // For any operation sequence under a size cap of S, total_size stays
    // strictly below S and equals the sum of current entry sizes.
    #[test]
    fn prop_size_cap_invariant(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let max_size = 512;
        let mut cache = BoundedCache::new(None, Some(max_size), None).unwrap();

        for op in ops {
            apply(&mut cache, op);

            prop_assert!(
                cache.total_size_bytes() < max_size,
                "total_size {} not below cap {}",
                cache.total_size_bytes(),
                max_size
            );

            let expected: usize = cache
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum();
            prop_assert_eq!(
                cache.total_size_bytes(),
                expected,
                "total_size out of sync with entries"
            );
        }
    }

    // For any valid key-value pair, storing the pair and then retrieving it
    // returns the exact same value that was stored.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut cache = BoundedCache::new(Some(100), None, None).unwrap();

        prop_assert!(cache.put(&key, value.clone()).unwrap());
        prop_assert_eq!(cache.get(&key).unwrap(), Some(&value));
    }

    // For any key that exists in the cache, after a delete a subsequent get
    // reports it absent, and a second delete reports it was not there.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut cache = BoundedCache::new(Some(100), None, None).unwrap();

        cache.put(&key, value).unwrap();
        prop_assert!(cache.delete(&key).unwrap());
        prop_assert_eq!(cache.get(&key).unwrap(), None);
        prop_assert!(!cache.delete(&key).unwrap());
    }

    // An entry rejected for exceeding the per-item cap is never present,
    // regardless of prior cache state, and evicts nothing.
    #[test]
    fn prop_oversized_entry_never_stored(
        seeds in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            0..10
        ),
        key in valid_key_strategy()
    ) {
        prop_assume!(!seeds.iter().any(|(k, _)| k == &key));

        let mut cache = BoundedCache::new(None, Some(100_000), Some(64)).unwrap();

        for (k, v) in &seeds {
            let _ = cache.put(k, v.clone()).unwrap();
        }
        let len_before = cache.len();

        let oversized = "x".repeat(65);
        prop_assert!(!cache.put(&key, oversized).unwrap());
        prop_assert_eq!(cache.get(&key).unwrap(), None);
        prop_assert_eq!(cache.len(), len_before, "rejection must evict nothing");
    }

    // For any set of unique keys filling the cache to capacity, inserting one
    // more evicts exactly the least recently touched key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::hash_set(valid_key_strategy(), 2..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys: Vec<String> = initial_keys.into_iter().collect();
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedCache::new(Some(capacity), None, None).unwrap();

        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            cache.put(key, format!("value_{}", key)).unwrap();
        }
        prop_assert_eq!(cache.len(), capacity);

        cache.put(&new_key, new_value).unwrap();

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.contains(&oldest_key).unwrap(), "oldest key should be evicted");
        prop_assert!(cache.contains(&new_key).unwrap());
        for key in unique_keys.iter().skip(1) {
            prop_assert!(cache.contains(key).unwrap(), "key '{}' should survive", key);
        }
    }

    // A get on the would-be victim promotes it; the next-oldest key is
    // evicted instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys: Vec<String> = keys.into_iter().collect();
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedCache::new(Some(capacity), None, None).unwrap();

        for key in &unique_keys {
            cache.put(key, format!("value_{}", key)).unwrap();
        }

        let accessed_key = unique_keys[0].clone();
        let expected_evicted = unique_keys[1].clone();
        let _ = cache.get(&accessed_key).unwrap();

        cache.put(&new_key, new_value).unwrap();

        prop_assert!(
            cache.contains(&accessed_key).unwrap(),
            "accessed key '{}' should not be evicted",
            accessed_key
        );
        prop_assert!(
            !cache.contains(&expected_evicted).unwrap(),
            "key '{}' should have been evicted as the oldest",
            expected_evicted
        );
        prop_assert!(cache.contains(&new_key).unwrap());
    }
}
