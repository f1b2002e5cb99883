//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain insertion-order model.

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::ObjCache;
use crate::config::Config;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_EXPIRATION: Duration = Duration::from_secs(300);

fn test_cache(limit: usize) -> ObjCache<String, String> {
    ObjCache::new(Config::new(limit, TEST_EXPIRATION))
}

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}"
}

/// Generates unique keys, in generation order
fn unique_keys_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9_]{1,16}", min..max).prop_map(|keys| {
        let mut seen = HashSet::new();
        keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
    })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Del { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Del { key }),
    ]
}

// == Reference Model ==
/// Front-to-back list of (key, value) with the same touch semantics.
#[derive(Default)]
struct Model {
    entries: VecDeque<(String, String)>,
}

impl Model {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn set(&mut self, key: String, value: String, limit: usize) {
        if let Some(pos) = self.position(&key) {
            if let Some(entry) = self.entries.remove(pos) {
                self.entries.push_back(entry);
            }
            return;
        }
        if self.entries.len() >= limit {
            self.entries.pop_front();
        }
        self.entries.push_back((key, value));
    }

    fn get(&self, key: &str) -> Option<&String> {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    fn del(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(pos) => self.entries.remove(pos).is_some(),
            None => false,
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Any interleaving of set/get/del keeps the index and order consistent and
    // matches the insertion-order model exactly.
    #[test]
    fn prop_matches_insertion_order_model(
        limit in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let cache = test_cache(limit);
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value.clone(), Duration::ZERO);
                    model.set(key, value, limit);
                }
                CacheOp::Get { key } => {
                    let got = cache.get(key.as_str());
                    prop_assert_eq!(got.as_deref(), model.get(&key));
                }
                CacheOp::Del { key } => {
                    prop_assert_eq!(cache.del(key.as_str()), model.del(&key));
                }
            }

            if let Err(violation) = cache.check_invariants() {
                prop_assert!(false, "invariant violated: {}", violation);
            }
            prop_assert!(cache.len() <= limit);
            prop_assert_eq!(cache.keys_in_order(), model.keys());
        }
    }

    // Storing a pair and reading it back returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let cache = test_cache(TEST_MAX_ENTRIES);

        cache.set(key.clone(), value.clone(), Duration::ZERO);

        let retrieved = cache.get(key.as_str());
        prop_assert_eq!(retrieved.as_deref(), Some(&value));
    }

    // Inserting limit + 1 distinct keys keeps exactly `limit` and drops the first.
    #[test]
    fn prop_capacity_bound(keys in unique_keys_strategy(2, 40)) {
        prop_assume!(keys.len() >= 2);
        let limit = keys.len() - 1;
        let cache = test_cache(limit);

        for key in &keys {
            cache.set(key.clone(), format!("value_{}", key), Duration::ZERO);
        }

        prop_assert_eq!(cache.len(), limit);
        prop_assert!(cache.get(keys[0].as_str()).is_none());
        for key in keys.iter().skip(1) {
            prop_assert!(cache.get(key.as_str()).is_some(), "key {} should survive", key);
        }
        prop_assert_eq!(cache.stats().evictions, 1);
    }

    // Deleting twice reports true then false; deleting an absent key changes nothing.
    #[test]
    fn prop_idempotent_delete(
        keys in unique_keys_strategy(1, 10),
        absent in "[A-Z]{20}"
    ) {
        let cache = test_cache(TEST_MAX_ENTRIES);
        for key in &keys {
            cache.set(key.clone(), key.clone(), Duration::ZERO);
        }
        let before = cache.keys_in_order();

        prop_assert!(!cache.del(absent.as_str()));
        prop_assert_eq!(cache.keys_in_order(), before);

        prop_assert!(cache.del(keys[0].as_str()));
        prop_assert!(!cache.del(keys[0].as_str()));
        prop_assert_eq!(cache.len(), keys.len() - 1);
    }

    // Re-setting an existing key saves it from the next capacity eviction.
    #[test]
    fn prop_refresh_moves_to_back(
        keys in unique_keys_strategy(3, 10),
        refresh_index in 0usize..100
    ) {
        prop_assume!(keys.len() >= 3);
        let (new_key, initial) = keys.split_last().unwrap();
        let limit = initial.len();
        let cache = test_cache(limit);

        for key in initial {
            cache.set(key.clone(), key.clone(), Duration::ZERO);
        }
        let refreshed = &initial[refresh_index % limit];
        cache.set(refreshed.clone(), "ignored".to_string(), Duration::ZERO);
        cache.set(new_key.clone(), new_key.clone(), Duration::ZERO);

        // The first key not refreshed is the eviction victim
        let victim = initial.iter().find(|k| *k != refreshed).unwrap();
        prop_assert!(cache.get(victim.as_str()).is_none());
        let kept = cache.get(refreshed.as_str());
        prop_assert_eq!(kept.as_deref(), Some(refreshed));
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // A zero TTL behaves exactly like the configured default.
    #[test]
    fn prop_default_ttl_substitution(key in key_strategy(), value in value_strategy()) {
        let default_ttl = Duration::from_millis(40);
        let defaulted: ObjCache<String, String> = ObjCache::new(Config::new(10, default_ttl));
        let explicit: ObjCache<String, String> = ObjCache::new(Config::new(10, TEST_EXPIRATION));

        defaulted.set(key.clone(), value.clone(), Duration::ZERO);
        explicit.set(key.clone(), value.clone(), default_ttl);

        prop_assert!(defaulted.get(key.as_str()).is_some());
        prop_assert!(explicit.get(key.as_str()).is_some());

        sleep(Duration::from_millis(100));

        prop_assert!(defaulted.get(key.as_str()).is_none());
        prop_assert!(explicit.get(key.as_str()).is_none());
    }
}
