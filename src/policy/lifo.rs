//! Last In, First Out cache core.
//!
//! The opposite of FIFO: the most recent arrival is the first eviction
//! victim, so old entries are the protected ones. Updating a resident key
//! re-promotes it to the top of the stack (it becomes the newest arrival
//! again).
//!
//! ## Generation-tagged stack
//!
//! Re-promotion is amortized O(1): the stack holds `(key, generation)` tags
//! and a side map records each key's live generation. A re-promoted key
//! pushes a fresh tag; the old tag stays buried and is recognized as stale
//! when eviction meets it.
//!
//! ```text
//!   stack: [(a,0)] [(b,0)] [(a,1)] [(c,0)]     live: a→1, b→0, c→0
//!                            ▲
//!                    (a,0) is stale: dropped on sight
//! ```
//!
//! Eviction pops from the top, dropping stale tags, holding pinned tags
//! aside, and taking the first live unpinned key. Held pinned tags are
//! pushed back in their original relative order.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::entry::{CacheEntry, EntrySnapshot};
use crate::error::CacheError;
use crate::stats::CacheStatistics;
use crate::traits::PolicyCache;

/// LIFO cache core: entry map + generation-tagged arrival stack.
#[derive(Debug)]
pub struct LifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: FxHashMap<K, CacheEntry<K, V>>,
    stack: Vec<(K, u64)>,
    live: FxHashMap<K, u64>,
    next_gen: u64,
    pinned: FxHashSet<K>,
    capacity: usize,
    stats: CacheStatistics,
}

impl<K, V> LifoCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            stack: Vec::with_capacity(capacity),
            live: FxHashMap::default(),
            next_gen: 0,
            pinned: FxHashSet::default(),
            capacity,
            stats: CacheStatistics::new(),
        }
    }

    fn push_tag(&mut self, key: K) {
        let generation = self.next_gen;
        self.next_gen += 1;
        self.live.insert(key.clone(), generation);
        self.stack.push((key, generation));
    }

    fn tag_is_live(&self, key: &K, generation: u64) -> bool {
        self.live.get(key) == Some(&generation) && self.entries.contains_key(key)
    }

    /// Evicts the newest unpinned entry. Skipped pinned tags go back in their
    /// original relative order; stale tags are dropped on sight.
    fn evict(&mut self) -> bool {
        let mut held: Vec<(K, u64)> = Vec::new();
        let mut victim = None;

        while let Some((key, generation)) = self.stack.pop() {
            if !self.tag_is_live(&key, generation) {
                continue;
            }
            if self.pinned.contains(&key) {
                held.push((key, generation));
                continue;
            }
            victim = Some(key);
            break;
        }

        // restore skipped pinned tags below the (removed) victim position
        while let Some(tag) = held.pop() {
            self.stack.push(tag);
        }

        match victim {
            Some(key) => {
                self.entries.remove(&key);
                self.live.remove(&key);
                self.stats.record_eviction();
                true
            },
            None => false,
        }
    }

    fn upsert(&mut self, key: K, value: V) -> bool {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.touch();
            // re-promote to the top of the stack
            self.push_tag(key);
            return true;
        }

        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity && !self.evict() {
            return false;
        }

        self.entries.insert(key.clone(), CacheEntry::new(key.clone(), value));
        self.push_tag(key);
        true
    }

    /// Drops buried stale tags once they dominate the stack, bounding its
    /// growth to O(live keys).
    fn compact_if_needed(&mut self) {
        if self.stack.len() > 32 && self.stack.len() > self.entries.len() * 2 {
            let mut seen = FxHashSet::default();
            let mut kept: Vec<(K, u64)> = Vec::with_capacity(self.entries.len());
            for (key, generation) in self.stack.drain(..).rev() {
                if self.live.get(&key) == Some(&generation)
                    && self.entries.contains_key(&key)
                    && seen.insert(key.clone())
                {
                    kept.push((key, generation));
                }
            }
            kept.reverse();
            self.stack = kept;
        }
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate_invariants(&self) {
        assert!(self.entries.len() <= self.capacity);
        assert_eq!(self.entries.len(), self.live.len());
        for key in self.entries.keys() {
            assert!(self.live.contains_key(key));
        }
        for key in &self.pinned {
            assert!(self.entries.contains_key(key), "pinned key missing from entries");
        }
        let live_tags = self
            .stack
            .iter()
            .filter(|(key, generation)| self.tag_is_live(key, *generation))
            .count();
        assert_eq!(live_tags, self.entries.len());
    }

    /// Resident keys bottom-of-stack first (next victim last).
    fn live_keys(&self) -> impl Iterator<Item = &K> {
        self.stack
            .iter()
            .filter(|(key, generation)| self.tag_is_live(key, *generation))
            .map(|(key, _)| key)
    }
}

impl<K, V> PolicyCache<K, V> for LifoCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) {
        self.upsert(key, value);
        self.compact_if_needed();

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
            self.live.remove(key);
            self.pinned.remove(key);
            // stale tags stay buried until eviction or compaction meets them
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.stack.clear();
        self.live.clear();
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
        self.compact_if_needed();
    }

    fn keys(&self) -> Vec<K> {
        self.live_keys().cloned().collect()
    }

    fn statistics(&self) -> CacheStatistics {
        self.stats.snapshot(self.pinned.len(), self.entries.len())
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>> {
        self.live_keys()
            .filter_map(|key| self.entries.get(key).map(|entry| entry.snapshot()))
            .collect()
    }
}
