//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with FIFO eviction and TTL
//! expiration. Absence is a normal outcome here, never an error: `get`
//! returns `Option`, and nothing in this module can fail.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};

// == TTL Cache ==
/// Capacity-bounded key-value store with per-entry expiry.
///
/// Eviction is FIFO: when the cache is full and a new key arrives, the
/// oldest-inserted entry is removed. Access never reorders entries.
/// Values are opaque; the cache only clones them out on `get`.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion-order tracker for FIFO eviction
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL applied when `set` omits an explicit one
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a new cache with the given capacity and default TTL.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a key-value pair with an optional TTL.
    ///
    /// Overwriting an existing key resets its `stored_at` and moves it to
    /// the back of the insertion order. When the cache is at capacity and
    /// the key is new, the oldest-inserted entry is evicted first.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        self.entries
            .insert(key.clone(), CacheEntry::new(value, effective_ttl));
        self.order.record(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if present and fresh. A present-but-expired entry
    /// is deleted as a side effect and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.remove_expired(key);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks for a fresh entry without cloning the value.
    ///
    /// Same freshness semantics as `get`, including lazy deletion of an
    /// expired entry, but does not count toward hits or misses.
    pub fn has(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.remove_expired(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry unconditionally. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Pattern Invalidation ==
    /// Removes every key matching the pattern. Returns the number removed.
    ///
    /// Used for bulk invalidation, e.g. all keys starting with
    /// `submissions:student:`.
    pub fn invalidate_pattern(&mut self, pattern: &Regex) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| pattern.is_match(key))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        matching.len()
    }

    // == Sweep Expired ==
    /// Removes all expired entries, returning the number removed.
    ///
    /// Called by the background sweeper so that cold keys which are never
    /// re-queried do not accumulate.
    pub fn sweep_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_expired(key);
        }

        expired.len()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the TTL applied when `set` omits one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn remove_expired(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.remove(key);
        self.stats.record_expiration();
        self.stats.set_total_entries(self.entries.len());
    }
}
