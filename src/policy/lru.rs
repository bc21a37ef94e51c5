//! # Least Recently Used (LRU) cache core
//!
//! The default policy for the file-content cache: entries live in an
//! arena-backed recency list, a hash index maps keys to list handles, and the
//! cold end of the list is the eviction end.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                        LruCore<K, V>                          │
//!   │                                                               │
//!   │   index: FxHashMap<K, SlotId>                                 │
//!   │   ┌─────────┬────────┐                                        │
//!   │   │  key    │ SlotId │──────────────┐                         │
//!   │   └─────────┴────────┘              ▼                         │
//!   │   order: OrderList<CacheEntry<K, V>>                          │
//!   │                                                               │
//!   │   front ─► [entry] ◄──► [entry] ◄──► [entry] ◄─ back          │
//!   │            (MRU)                      (eviction end)          │
//!   │                                                               │
//!   │   pinned: FxHashSet<K>      stats: CacheStatistics            │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction with pinning
//!
//! The victim search walks from the back of the list toward the front and
//! takes the first unpinned entry. Pinned entries are skipped in place; if
//! the walk exhausts the list, no eviction happens and the incoming insert
//! is refused silently.
//!
//! ```text
//!   back ─► [C pinned] ─► [B] ─► [A]        victim = B
//! ```
//!
//! ## Operations
//!
//! | Method      | Complexity | Reorders  |
//! |-------------|------------|-----------|
//! | `put`       | O(1)*      | to front  |
//! | `get`       | O(1)       | to front  |
//! | `contains`  | O(1)       | no        |
//! | `remove`    | O(1)       | —         |
//! | eviction    | O(p)       | — (p = pinned run at the back)   |
//!
//! The core is single-threaded; the concurrent manager provides the locking.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::ds::order_list::OrderList;
use crate::ds::slot_arena::SlotId;
use crate::entry::{CacheEntry, EntrySnapshot};
use crate::error::CacheError;
use crate::stats::CacheStatistics;
use crate::traits::PolicyCache;

/// LRU cache core: hash index + arena-backed recency list.
#[derive(Debug)]
pub struct LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    index: FxHashMap<K, SlotId>,
    order: OrderList<CacheEntry<K, V>>,
    pinned: FxHashSet<K>,
    capacity: usize,
    stats: CacheStatistics,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an LRU core with the given capacity. Capacity 0 creates a
    /// cache that accepts no entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: OrderList::with_capacity(capacity),
            pinned: FxHashSet::default(),
            capacity,
            stats: CacheStatistics::new(),
        }
    }

    /// Evicts the coldest unpinned entry. Returns `false` when every
    /// resident entry is pinned.
    fn evict(&mut self) -> bool {
        let mut cursor = self.order.back_id();
        while let Some(id) = cursor {
            let pinned = self
                .order
                .get(id)
                .map(|entry| self.pinned.contains(&entry.key))
                .unwrap_or(false);
            if !pinned {
                if let Some(victim) = self.order.remove(id) {
                    self.index.remove(&victim.key);
                    self.stats.record_eviction();
                    return true;
                }
                return false;
            }
            cursor = self.order.prev_of(id);
        }
        false
    }

    /// Shared insert path for `put` and `prefetch`. Returns `true` when the
    /// key is resident afterwards.
    fn upsert(&mut self, key: K, value: V) -> bool {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
                entry.touch();
            }
            self.order.move_to_front(id);
            return true;
        }

        if self.capacity == 0 {
            return false;
        }
        if self.index.len() >= self.capacity && !self.evict() {
            // full and fully pinned: refuse the insert
            return false;
        }

        let id = self.order.push_front(CacheEntry::new(key.clone(), value));
        self.index.insert(key, id);
        true
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate_invariants(&self) {
        assert!(self.index.len() <= self.capacity);
        assert_eq!(self.index.len(), self.order.len());
        for key in &self.pinned {
            assert!(self.index.contains_key(key), "pinned key missing from index");
        }
        self.order.debug_validate_invariants();
    }
}

impl<K, V> PolicyCache<K, V> for LruCore<K, V>
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
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound);
        };

        self.stats.record_hit();
        let value = {
            let entry = self.order.get_mut(id).expect("indexed entry missing");
            entry.record_access();
            entry.value.clone()
        };
        self.order.move_to_front(id);
        Ok(value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn remove(&mut self, key: &K) {
        if let Some(id) = self.index.remove(key) {
            self.order.remove(id);
            self.pinned.remove(key);
        }
    }

    fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
        self.pinned.clear();
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn pin(&mut self, key: &K) {
        if let Some(&id) = self.index.get(key) {
            self.pinned.insert(key.clone());
            if let Some(entry) = self.order.get_mut(id) {
                entry.pinned = true;
            }
        }
    }

    fn unpin(&mut self, key: &K) {
        self.pinned.remove(key);
        if let Some(&id) = self.index.get(key)
            && let Some(entry) = self.order.get_mut(id)
        {
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
        self.order.iter().map(|entry| entry.key.clone()).collect()
    }

    fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot(self.pinned.len(), self.index.len())
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>> {
        self.order.iter().map(|entry| entry.snapshot()).collect()
    }
}
