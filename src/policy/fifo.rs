//! First In, First Out cache core.
//!
//! The order index is a queue of keys in arrival order. Reads never reorder;
//! only arrival matters. `remove` leaves the departed key in the queue as a
//! stale marker that eviction silently skips, keeping `remove` O(1).
//!
//! Eviction dequeues until it finds a key that is still resident and
//! unpinned. Pinned keys it walks past are re-enqueued at the back, bounded
//! to a single rotation of the queue; if the rotation finds no victim, the
//! incoming insert is refused.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::hash::Hash;

use crate::entry::{CacheEntry, EntrySnapshot};
use crate::error::CacheError;
use crate::stats::CacheStatistics;
use crate::traits::PolicyCache;

/// FIFO cache core: entry map + arrival queue with stale-skip eviction.
#[derive(Debug)]
pub struct FifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: FxHashMap<K, CacheEntry<K, V>>,
    arrival: VecDeque<K>,
    pinned: FxHashSet<K>,
    capacity: usize,
    stats: CacheStatistics,
}

impl<K, V> FifoCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            arrival: VecDeque::with_capacity(capacity),
            pinned: FxHashSet::default(),
            capacity,
            stats: CacheStatistics::new(),
        }
    }

    /// Evicts the oldest resident unpinned entry. One rotation bound: pinned
    /// keys are pushed back in passing, stale markers are dropped.
    fn evict(&mut self) -> bool {
        let rotation = self.arrival.len();
        for _ in 0..rotation {
            let Some(key) = self.arrival.pop_front() else {
                return false;
            };
            if !self.entries.contains_key(&key) {
                // stale marker left behind by remove()
                continue;
            }
            if self.pinned.contains(&key) {
                self.arrival.push_back(key);
                continue;
            }
            self.entries.remove(&key);
            self.stats.record_eviction();
            return true;
        }
        false
    }

    fn upsert(&mut self, key: K, value: V) -> bool {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.touch();
            // arrival order is sticky: updates do not reorder
            return true;
        }

        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity && !self.evict() {
            return false;
        }

        self.arrival.push_back(key.clone());
        self.entries.insert(key.clone(), CacheEntry::new(key, value));
        true
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate_invariants(&self) {
        assert!(self.entries.len() <= self.capacity);
        // the queue may carry stale markers but never fewer keys than entries
        assert!(self.arrival.len() >= self.entries.len());
        for key in &self.pinned {
            assert!(self.entries.contains_key(key), "pinned key missing from entries");
        }
    }
}

impl<K, V> PolicyCache<K, V> for FifoCore<K, V>
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
        Ok(entry.value.clone())
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn remove(&mut self, key: &K) {
        if self.entries.remove(key).is_some() {
            self.pinned.remove(key);
            // the queue entry stays behind as a stale marker
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.arrival.clear();
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
        self.arrival
            .iter()
            .filter(|key| self.entries.contains_key(*key))
            .cloned()
            .collect()
    }

    fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot(self.pinned.len(), self.entries.len())
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>> {
        self.arrival
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| entry.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod basic_operations {
        use super::*;

        #[test]
        fn put_and_get() {
            let mut cache = FifoCore::new(10);
            cache.put("key", "value");
            assert_eq!(cache.get(&"key").unwrap(), "value");
        }

        #[test]
        fn update_keeps_arrival_position() {
            let mut cache = FifoCore::new(3);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.put(3, "c");
            cache.put(1, "A");

            cache.put(4, "d");
            // 1 is still the oldest arrival despite the update
            assert!(!cache.contains(&1));
            assert!(cache.contains(&2));
        }

        #[test]
        fn get_does_not_reorder() {
            let mut cache = FifoCore::new(3);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.put(3, "c");
            for _ in 0..50 {
                let _ = cache.get(&1);
            }

            cache.put(4, "d");
            assert!(!cache.contains(&1), "reads must not protect a FIFO entry");
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn arrival_order_decides_the_victim() {
            let mut cache = FifoCore::new(3);
            cache.put("f1", 1);
            cache.put("f2", 2);
            cache.put("f3", 3);
            cache.put("f4", 4);

            assert!(!cache.contains(&"f1"));
            assert!(cache.contains(&"f2"));
            assert!(cache.contains(&"f3"));
            assert!(cache.contains(&"f4"));
        }

        #[test]
        fn stale_queue_entries_are_skipped() {
            let mut cache = FifoCore::new(3);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.put(3, "c");
            cache.remove(&1);
            cache.put(4, "d");

            // removing 1 freed a slot; inserting 4 needs no eviction
            assert_eq!(cache.statistics().evictions, 0);

            cache.put(5, "e");
            // the stale marker for 1 is skipped; 2 is the true oldest
            assert!(!cache.contains(&2));
            assert_eq!(cache.statistics().evictions, 1);
        }

        #[test]
        fn capacity_zero_rejects_everything() {
            let mut cache = FifoCore::new(0);
            cache.put(1, "a");
            assert!(cache.is_empty());
        }
    }

    mod pinning {
        use super::*;

        #[test]
        fn pinned_head_is_rotated_not_evicted() {
            let mut cache = FifoCore::new(2);
            cache.put(1, "a");
            cache.pin(&1);
            cache.put(2, "b");
            cache.put(3, "c");

            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
            assert!(cache.contains(&3));
        }

        #[test]
        fn fully_pinned_cache_refuses_inserts() {
            let mut cache = FifoCore::new(2);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.pin(&1);
            cache.pin(&2);

            cache.put(3, "c");
            assert_eq!(cache.len(), 2);
            assert!(!cache.contains(&3));
            assert_eq!(cache.statistics().evictions, 0);
        }

        #[test]
        fn unpinned_key_becomes_evictable_again() {
            let mut cache = FifoCore::new(2);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.pin(&1);
            cache.put(3, "c"); // evicts 2, rotates 1 back
            cache.unpin(&1);
            cache.put(4, "d");

            assert!(!cache.contains(&1) || !cache.contains(&3));
            assert!(cache.contains(&4));
            assert_eq!(cache.len(), 2);
        }
    }

    mod statistics_and_ordering {
        use super::*;

        #[test]
        fn keys_follow_arrival_order() {
            let mut cache = FifoCore::new(4);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.put(3, "c");
            cache.remove(&2);

            assert_eq!(cache.keys(), vec![1, 3]);
        }

        #[test]
        fn prefetch_skips_hit_miss_accounting() {
            let mut cache = FifoCore::new(4);
            cache.prefetch("k", 1);
            let stats = cache.statistics();
            assert_eq!(stats.prefetched_items, 1);
            assert_eq!(stats.total_accesses, 0);
        }

        #[test]
        fn snapshot_gauges_reflect_state() {
            let mut cache = FifoCore::new(4);
            cache.put(1, "a");
            cache.put(2, "b");
            cache.pin(&2);

            let stats = cache.statistics();
            assert_eq!(stats.current_size, 2);
            assert_eq!(stats.pinned_items, 1);
        }
    }
}
