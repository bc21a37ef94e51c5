//! # Least Frequently Used (LFU) cache core
//!
//! Entries are ranked by a per-key frequency counter held in
//! [`FrequencyBuckets`]: `freq → ordered bucket` lists chained in ascending
//! frequency with `min_freq` pointing at the lowest populated bucket.
//!
//! - Fresh inserts enter at frequency 1 (and `min_freq` becomes 1).
//! - `get` and value updates move the key one bucket up; when the emptied
//!   bucket was `min_freq`, `min_freq` advances.
//! - Eviction scans from `min_freq` upward, oldest arrival first within a
//!   bucket, and takes the first unpinned key. A fully pinned cache refuses
//!   the incoming insert.
//!
//! The policy frequency counter and the entry's `access_count` are distinct:
//! the former ranks eviction and moves on writes too, the latter counts read
//! hits only.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::entry::{CacheEntry, EntrySnapshot};
use crate::error::CacheError;
use crate::stats::CacheStatistics;
use crate::traits::PolicyCache;

/// LFU cache core: entry map + frequency-bucket order index.
#[derive(Debug)]
pub struct LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: FxHashMap<K, CacheEntry<K, V>>,
    buckets: FrequencyBuckets<K>,
    pinned: FxHashSet<K>,
    capacity: usize,
    stats: CacheStatistics,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FrequencyBuckets::new(),
            pinned: FxHashSet::default(),
            capacity,
            stats: CacheStatistics::new(),
        }
    }

    /// Current policy frequency of a resident key.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }

    /// Evicts the lowest-frequency unpinned entry. Returns `false` when all
    /// resident entries are pinned.
    fn evict(&mut self) -> bool {
        let Some(victim) = self.buckets.find_evictable(|key| !self.pinned.contains(key)) else {
            return false;
        };
        self.buckets.remove(&victim);
        self.entries.remove(&victim);
        self.stats.record_eviction();
        true
    }

    fn upsert(&mut self, key: K, value: V) -> bool {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.touch();
            self.buckets.touch(&key);
            return true;
        }

        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity && !self.evict() {
            return false;
        }

        self.entries.insert(key.clone(), CacheEntry::new(key.clone(), value));
        self.buckets.insert(key);
        true
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate_invariants(&self) {
        assert!(self.entries.len() <= self.capacity);
        assert_eq!(self.entries.len(), self.buckets.len());
        for key in &self.pinned {
            assert!(self.entries.contains_key(key), "pinned key missing from entries");
        }
        self.buckets.debug_validate_invariants();
    }
}

impl<K, V> PolicyCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) {
        self.upsert(key, value);

        #[cfg(debug_assertions)]
        self.debug_validate_invariants();
    }

    fn get(&mut self, key: &K) -> Result<V, CacheError> {
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound);
        };

        self.stats.record_hit();
        entry.record_access();
        let value = entry.value.clone();
        self.buckets.touch(key);
        Ok(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn remove(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            self.buckets.remove(key);
            self.pinned.remove(key);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.buckets.clear();
        self.pinned.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn pin(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.pinned = true;
            self.pinned.insert(key.clone());
        }
    }

    fn unpin(&mut self, key: &K) {
        self.pinned.remove(key);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.pinned = false;
        }
    }

    fn is_pinned(&self, key: &K) -> bool {
        self.pinned.contains(key)
    }

    fn prefetch(&mut self, key: K, value: V) {
        if self.upsert(key, value) {
            self.stats.record_prefetch();
        }
    }

    fn keys(&self) -> Vec<K> {
        self.buckets.keys_ascending()
    }

    fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot(self.pinned.len(), self.entries.len())
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>> {
        self.buckets
            .keys_ascending()
            .into_iter()
            .filter_map(|key| self.entries.get(&key).map(|entry| entry.snapshot()))
            .collect()
    }
}
