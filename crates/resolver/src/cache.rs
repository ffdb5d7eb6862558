//! Bounded, time-expiring LRU cache.
//!
//! Entries live in an [`IndexMap`] ordered by recency: the front holds the
//! least recently used entry and is evicted first once the table is full.
//! Every entry also records the instant it was inserted and stops being
//! served once its age reaches the configured TTL.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::{Equivalent, IndexMap};

use crate::clock::{Clock, SystemClock};

/// Maximum number of distinct keys retained by default.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Capacity and lifetime bounds for an [`ExpiringLruCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl CachePolicy {
    pub const fn new(max_entries: usize, ttl: Duration) -> Self {
        Self { max_entries, ttl }
    }

    /// A policy that never stores anything.
    pub const fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// A policy with no practical capacity or lifetime bound.
    pub const fn unbounded() -> Self {
        Self::new(usize::MAX, Duration::MAX)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct ExpiringLruCache<K, V> {
    entries: IndexMap<K, CacheEntry<V>>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl<K: Hash + Eq, V: Clone> ExpiringLruCache<K, V> {
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: IndexMap::new(),
            policy,
            clock,
        }
    }

    /// Number of stored entries, including ones that expired but were not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a clone of the value for `key` if it is present and fresh, and
    /// marks it as most recently used. Expired entries are dropped on access.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let index = self.entries.get_index_of(key)?;
        let now = self.clock.now();

        if self.is_expired(&self.entries[index], now) {
            self.entries.shift_remove_index(index);
            return None;
        }

        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get_index(last).map(|(_, entry)| entry.value.clone())
    }

    /// Whether `key` holds a fresh entry. Does not touch recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let now = self.clock.now();
        self.entries.get(key).is_some_and(|entry| !self.is_expired(entry, now))
    }

    /// Stores `value` under `key`, replacing any previous entry and evicting
    /// expired entries first, then least recently used ones while full.
    pub fn insert(&mut self, key: K, value: V) {
        if self.policy.max_entries == 0 {
            return;
        }

        let now = self.clock.now();
        self.purge_expired_at(now);
        self.entries.shift_remove(&key);

        while self.entries.len() >= self.policy.max_entries {
            self.entries.shift_remove_index(0);
        }

        self.entries.insert(key, CacheEntry { value, inserted_at: now });
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.shift_remove(key).map(|entry| entry.value)
    }

    fn purge_expired_at(&mut self, now: Instant) {
        let ttl = self.policy.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.policy.ttl
    }
}
