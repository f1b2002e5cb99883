//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::Arc;
use std::time::{Duration, Instant};

// == Cache Entry ==
/// One cached item.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    /// Lookup key, kept so the front of the sequence can be unindexed
    pub key: K,
    /// The stored object, shared rather than copied
    pub value: Arc<V>,
    /// Monotonic expiry instant, None = beyond the clock's range (never expires)
    pub expire_at: Option<Instant>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(key: K, value: Arc<V>, ttl: Duration, now: Instant) -> Self {
        Self {
            key,
            value,
            expire_at: now.checked_add(ttl),
        }
    }

    // == Is Stale ==
    /// Checks if the entry has expired.
    ///
    /// An entry is stale only once `now` is strictly past its expiry instant.
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(expires) => expires < now,
            None => false,
        }
    }

    /// Replaces the value and restarts the TTL from `now`.
    pub fn renew(&mut self, value: Arc<V>, ttl: Duration, now: Instant) {
        self.value = value;
        self.expire_at = now.checked_add(ttl);
    }
}
