//! Cache Store Module
//!
//! Main cache engine combining a key index with an arena-backed touch order.
//! Both triggers, TTL expiration and the entry limit, evict from the front of
//! that order.
//!
//! The front is the entry least recently inserted or refreshed. Lookups do not
//! move entries, so capacity eviction is insertion order rather than LRU. With
//! mixed TTLs touch order is not expiry order: the sweep run before each
//! insertion stops at the first fresh entry, leaving stale entries behind it
//! until a lookup, [`ObjCache::purge_expired`] or eviction reaches them.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::cache::order::{Handle, TouchOrder};
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::{Config, RefreshPolicy};

/// Upper bound on slots reserved up front, whatever the entry limit.
const MAX_PREALLOCATED: usize = 1024;

// == Inner State ==
/// Index and touch order, always locked together.
struct Inner<K, V> {
    index: HashMap<K, Handle>,
    order: TouchOrder<CacheEntry<K, V>>,
    /// Live entry count, maintained incrementally
    live: usize,
}

impl<K: Hash + Eq + Clone, V> Inner<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            order: TouchOrder::with_capacity(capacity),
            live: 0,
        }
    }

    fn lookup<Q>(&self, key: &Q) -> Option<(Handle, &CacheEntry<K, V>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.order.get(handle).map(|entry| (handle, entry))
    }

    fn insert(&mut self, entry: CacheEntry<K, V>) {
        let key = entry.key.clone();
        let handle = self.order.push_back(entry);
        self.index.insert(key, handle);
        self.live += 1;
    }

    /// Unlinks the entry at `handle` from both the order and the index.
    fn remove_handle(&mut self, handle: Handle) -> Option<CacheEntry<K, V>> {
        let entry = self.order.remove(handle)?;
        self.index.remove(&entry.key);
        self.live -= 1;
        Some(entry)
    }

    // == Expiration Sweep ==
    /// Pops stale entries off the front until a fresh one (or nothing) is left.
    fn sweep_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some((handle, entry)) = self.order.front() {
            if !entry.is_stale(now) {
                break;
            }
            self.remove_handle(handle);
            removed += 1;
        }
        removed
    }

    // == Capacity Eviction ==
    /// Removes the front entry whether or not it is stale.
    fn evict_front(&mut self) -> bool {
        match self.order.pop_front() {
            Some(entry) => {
                self.index.remove(&entry.key);
                self.live -= 1;
                true
            }
            None => false,
        }
    }

    /// Removes every stale entry, wherever it sits in the order.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let removed = self.order.retain(|entry| !entry.is_stale(now));
        for entry in &removed {
            self.index.remove(&entry.key);
        }
        self.live -= removed.len();
        removed.len()
    }

    #[cfg(test)]
    fn check_invariants(&self) -> Result<(), String> {
        if self.live != self.order.len() {
            return Err(format!(
                "live count {} != sequence length {}",
                self.live,
                self.order.len()
            ));
        }
        if self.live != self.index.len() {
            return Err(format!(
                "live count {} != index size {}",
                self.live,
                self.index.len()
            ));
        }
        let mut walked = 0;
        for (handle, entry) in self.order.iter() {
            walked += 1;
            if self.index.get(&entry.key) != Some(&handle) {
                return Err(format!("index does not point at sequence slot {:?}", handle));
            }
        }
        if walked != self.live {
            return Err(format!(
                "walked {} entries but live count is {}",
                walked, self.live
            ));
        }
        Ok(())
    }
}

// == Object Cache ==
/// Thread-safe object cache with TTL expiration and an entry limit.
///
/// Values are held behind [`Arc`] and handed back by identity; the cache never
/// clones or inspects them.
pub struct ObjCache<K, V> {
    inner: RwLock<Inner<K, V>>,
    config: Config,
    stats: StatsRecorder,
}

impl<K, V> fmt::Debug for ObjCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjCache")
            .field("config", &self.config)
            .field("len", &self.inner.read().live)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> Default for ObjCache<K, V> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<K: Hash + Eq + Clone, V> ObjCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache. Never fails.
    ///
    /// An entry limit of zero is raised to one.
    ///
    /// # Arguments
    /// * `config` - Entry limit, default TTL and refresh policy
    pub fn new(mut config: Config) -> Self {
        if config.max_entry_limit == 0 {
            warn!("max_entry_limit of 0 is not usable, clamping to 1");
            config.max_entry_limit = 1;
        }
        debug!(
            max_entry_limit = config.max_entry_limit,
            expiration = ?config.expiration,
            refresh = ?config.refresh,
            "object cache created"
        );
        let capacity = config.max_entry_limit.min(MAX_PREALLOCATED);
        Self {
            inner: RwLock::new(Inner::with_capacity(capacity)),
            config,
            stats: StatsRecorder::default(),
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Set ==
    /// Inserts `value` under `key`, or refreshes an existing entry.
    ///
    /// A zero `ttl` means the configured default. For a new key, stale entries
    /// are first swept off the front and, if the cache is still full, the
    /// front entry is evicted. For an existing key the entry moves to the back;
    /// under [`RefreshPolicy::Reposition`] its value and expiry are kept.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Time to live, `Duration::ZERO` for the configured default
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.set_shared(key, Arc::new(value), ttl);
    }

    /// Like [`set`](ObjCache::set), for a value that is already shared.
    pub fn set_shared(&self, key: K, value: Arc<V>, ttl: Duration) {
        let ttl = if ttl.is_zero() {
            self.config.expiration
        } else {
            ttl
        };
        let now = Instant::now();
        let mut inner = self.inner.write();

        let existing = inner.index.get(&key).copied();
        if let Some(handle) = existing {
            inner.order.move_to_back(handle);
            if self.config.refresh == RefreshPolicy::Replace {
                if let Some(entry) = inner.order.get_mut(handle) {
                    entry.renew(value, ttl, now);
                }
            }
            self.stats.record_refresh();
            return;
        }

        let swept = inner.sweep_expired(now);
        if swept > 0 {
            debug!(removed = swept, "expiration sweep reclaimed stale entries");
            self.stats.record_expirations(swept);
        }

        if inner.live >= self.config.max_entry_limit && inner.evict_front() {
            trace!(live = inner.live, "evicted front entry at capacity");
            self.stats.record_eviction();
        }

        inner.insert(CacheEntry::new(key, value, ttl, now));
        self.stats.record_insertion();
    }

    // == Get ==
    /// Retrieves the value for `key` if present and not stale.
    ///
    /// A fresh hit is served under shared access. A stale entry is removed
    /// after re-acquiring exclusive access and re-checking it.
    ///
    /// # Arguments
    /// * `key` - The key to retrieve
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        {
            let inner = self.inner.read();
            match inner.lookup(key) {
                None => {
                    self.stats.record_miss();
                    return None;
                }
                Some((_, entry)) if !entry.is_stale(now) => {
                    self.stats.record_hit();
                    return Some(Arc::clone(&entry.value));
                }
                Some(_) => {}
            }
        }

        let mut inner = self.inner.write();
        // Another caller may have removed or renewed it between the two locks
        match inner.lookup(key) {
            Some((_, entry)) if !entry.is_stale(now) => {
                self.stats.record_hit();
                return Some(Arc::clone(&entry.value));
            }
            Some((handle, _)) => {
                inner.remove_handle(handle);
                trace!("lazily expired stale entry on lookup");
                self.stats.record_expirations(1);
            }
            None => {}
        }
        self.stats.record_miss();
        None
    }

    /// Returns true if `key` holds a fresh entry. Does not mutate or count.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.inner
            .read()
            .lookup(key)
            .is_some_and(|(_, entry)| !entry.is_stale(now))
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns whether one was present.
    ///
    /// # Arguments
    /// * `key` - The key to delete
    pub fn del<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.write();
        match inner.index.get(key).copied() {
            Some(handle) => inner.remove_handle(handle).is_some(),
            None => false,
        }
    }

    // == Purge Expired ==
    /// Removes all stale entries, including those behind a fresh front entry.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let removed = self.inner.write().purge_expired(Instant::now());
        if removed > 0 {
            debug!(removed, "purged stale entries");
            self.stats.record_expirations(removed);
        }
        removed
    }

    /// Drops every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.index.clear();
        inner.order.clear();
        inner.live = 0;
    }

    // == Length ==
    /// Returns the number of live entries, stale ones not yet reclaimed included.
    pub fn len(&self) -> usize {
        self.inner.read().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Verifies the index/sequence bijection and the live count.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        self.inner.read().check_invariants()
    }

    /// Keys from front to back.
    #[cfg(test)]
    pub(crate) fn keys_in_order(&self) -> Vec<K> {
        self.inner
            .read()
            .order
            .iter()
            .map(|(_, entry)| entry.key.clone())
            .collect()
    }
}
