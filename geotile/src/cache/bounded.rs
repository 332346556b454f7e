//! Capacity-bounded associative cache with per-entry cost.
//!
//! Every entry carries a scalar cost; the sum of all costs never exceeds
//! the configured maximum. When an insert would overflow the budget, the
//! least recently used entries are evicted until it fits.
//!
//! Recency order is kept by an unbounded [`lru::LruCache`]; this wrapper
//! owns the cost budget and decides when to pop from the cold end.
//!
//! # Removal notifications
//!
//! A single listener receives every entry that leaves the cache together with
//! a [`RemovalCause`]. The cause lets owners tell a policy eviction (the
//! backing resource should go) from a plain removal (the index is being torn
//! down but the resource must survive).

use std::fmt;
use std::hash::Hash;

use lru::LruCache;
use serde::Serialize;

/// Why an entry left a [`BoundedCostCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Evicted to make room, or removed with eviction semantics requested.
    Evicted,
    /// Removed without eviction semantics (explicit removal, clear, drop).
    Removed,
    /// Overwritten by an insert for the same key.
    Replaced,
}

impl RemovalCause {
    /// `true` when the owner should release the entry's backing resource.
    pub fn was_evicted(self) -> bool {
        matches!(self, RemovalCause::Evicted)
    }
}

/// Callback invoked for every entry leaving the cache.
pub type RemovalListener<K, V> = Box<dyn FnMut(&K, &V, RemovalCause) + Send>;

/// Counters kept by a [`BoundedCostCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundedCacheStats {
    /// `object()` calls that found the key
    pub hits: u64,
    /// `object()` calls that missed
    pub misses: u64,
    /// Accepted inserts
    pub inserts: u64,
    /// Inserts refused because the entry alone exceeded the budget
    pub rejected: u64,
    /// Entries that left with [`RemovalCause::Evicted`]
    pub evictions: u64,
}

/// LRU cache bounded by the total cost of its entries.
pub struct BoundedCostCache<K: Eq + Hash, V> {
    /// Value and its cost, most recently used at the front.
    entries: LruCache<K, (V, u64)>,
    total_cost: u64,
    max_cost: u64,
    listener: Option<RemovalListener<K, V>>,
    stats: BoundedCacheStats,
}

impl<K, V> BoundedCostCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache with the given cost ceiling.
    pub fn new(max_cost: u64) -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_cost: 0,
            max_cost,
            listener: None,
            stats: BoundedCacheStats::default(),
        }
    }

    /// Create an empty cache that reports removals to `listener`.
    pub fn with_listener(
        max_cost: u64,
        listener: impl FnMut(&K, &V, RemovalCause) + Send + 'static,
    ) -> Self {
        let mut cache = Self::new(max_cost);
        cache.listener = Some(Box::new(listener));
        cache
    }

    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> BoundedCacheStats {
        self.stats
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Change the cost ceiling, evicting LRU entries if the cache is now over it.
    pub fn set_max_cost(&mut self, max_cost: u64) {
        self.max_cost = max_cost;
        self.trim(max_cost);
    }

    /// Insert `value` under `key` with the given cost.
    ///
    /// Returns `false` without touching the cache if `cost` alone exceeds the
    /// ceiling. An existing entry for `key` is replaced.
    pub fn insert(&mut self, key: K, value: V, cost: u64) -> bool {
        if cost > self.max_cost {
            self.stats.rejected += 1;
            return false;
        }

        if let Some((old, old_cost)) = self.entries.pop(&key) {
            self.total_cost -= old_cost;
            self.notify(&key, &old, RemovalCause::Replaced);
        }
        self.trim(self.max_cost - cost);

        self.entries.push(key, (value, cost));
        self.total_cost += cost;
        self.stats.inserts += 1;
        true
    }

    /// Look up `key`, marking it most recently used.
    pub fn object(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        match self.entries.get(key) {
            Some((value, _)) => {
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.peek(key).map(|(value, _)| value)
    }

    /// Cost recorded for `key` at insertion time.
    pub fn cost_of(&self, key: &K) -> Option<u64> {
        self.entries.peek(key).map(|(_, cost)| *cost)
    }

    /// Remove `key`, notifying the listener with `cause`.
    pub fn remove(&mut self, key: &K, cause: RemovalCause) -> Option<V> {
        let (value, cost) = self.entries.pop(key)?;
        self.total_cost -= cost;
        self.notify(key, &value, cause);
        Some(value)
    }

    /// Snapshot of the keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Remove every entry with [`RemovalCause::Removed`].
    pub fn clear(&mut self) {
        while let Some((key, (value, _))) = self.entries.pop_lru() {
            self.notify(&key, &value, RemovalCause::Removed);
        }
        self.total_cost = 0;
    }

    fn trim(&mut self, limit: u64) {
        while self.total_cost > limit {
            let Some((key, (value, cost))) = self.entries.pop_lru() else {
                break;
            };
            self.total_cost -= cost;
            self.notify(&key, &value, RemovalCause::Evicted);
        }
    }

    fn notify(&mut self, key: &K, value: &V, cause: RemovalCause) {
        if cause == RemovalCause::Evicted {
            self.stats.evictions += 1;
        }
        if let Some(listener) = self.listener.as_mut() {
            listener(key, value, cause);
        }
    }
}

impl<K: Eq + Hash, V> Drop for BoundedCostCache<K, V> {
    // Teardown is a removal, never an eviction.
    fn drop(&mut self) {
        let Some(mut listener) = self.listener.take() else {
            return;
        };
        for (key, (value, _)) in self.entries.iter() {
            listener(key, value, RemovalCause::Removed);
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for BoundedCostCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCostCache")
            .field("len", &self.entries.len())
            .field("total_cost", &self.total_cost)
            .field("max_cost", &self.max_cost)
            .field("stats", &self.stats)
            .finish()
    }
}
