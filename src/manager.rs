//! Policy-switching cache manager.
//!
//! Owns one policy core and layers workload analytics on top of it:
//!
//! - **Reconfiguration** (`set_policy`, `resize`) replaces the core with a
//!   fresh empty one. This is a design contract: reconfiguration is
//!   destructive, and callers that need the contents back reload them through
//!   [`warmup`](CacheManager::warmup). The access-pattern history survives a
//!   reconfiguration: it describes the workload, not the cache contents.
//! - **Hot-key analytics**: resident entries ranked by access count, plus a
//!   per-key sliding-window access tracker with a documented hot threshold
//!   of 0.1 accesses/second.
//! - **Workload advisories**: when the hit rate is poor over a meaningful
//!   sample, [`optimize_for_workload`](CacheManager::optimize_for_workload)
//!   surfaces an advisory event. It never switches the policy on its own.

use std::hash::Hash;

use tracing::{debug, info};

use crate::ds::access_log::AccessLog;
use crate::error::CacheError;
use crate::policy::{CachePolicy, PolicyCore};
use crate::stats::{CacheStatistics, HotEntryInfo};
use crate::traits::PolicyCache;

/// Access rate above which a key counts as hot (accesses per second over the
/// retained window).
pub const HOT_ACCESS_RATE: f64 = 0.1;

/// Hit-rate floor (percent) below which a workload advisory is raised.
const ADVISORY_HIT_RATE_FLOOR: f64 = 50.0;
/// Minimum accesses before the hit rate is considered meaningful.
const ADVISORY_MIN_ACCESSES: u64 = 100;

/// Advisory event produced when the current policy serves the workload badly.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadAdvice {
    pub policy: CachePolicy,
    pub hit_rate: f64,
    pub total_accesses: u64,
}

/// Cache manager: one policy core plus analytics and reconfiguration.
#[derive(Debug)]
pub struct CacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    policy: CachePolicy,
    capacity: usize,
    inner: PolicyCore<K, V>,
    history: AccessLog<K>,
}

impl<K, V> CacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, policy: CachePolicy) -> Self {
        Self {
            policy,
            capacity,
            inner: PolicyCore::new(policy, capacity),
            history: AccessLog::new(),
        }
    }

    // -- cache operations -------------------------------------------------

    pub fn put(&mut self, key: K, value: V) {
        self.inner.put(key, value);
    }

    pub fn get(&mut self, key: &K) -> Result<V, CacheError> {
        self.inner.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Removes a single key. This, not [`clear`](Self::clear), is the right
    /// call when the façade deletes one file.
    pub fn remove(&mut self, key: &K) {
        self.inner.remove(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }

    pub fn pin(&mut self, key: &K) {
        self.inner.pin(key)
    }

    pub fn unpin(&mut self, key: &K) {
        self.inner.unpin(key)
    }

    pub fn is_pinned(&self, key: &K) -> bool {
        self.inner.is_pinned(key)
    }

    pub fn prefetch(&mut self, key: K, value: V) {
        self.inner.prefetch(key, value)
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.keys()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // -- reconfiguration --------------------------------------------------

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Replaces the core with a fresh empty one running `policy`.
    /// Entries, statistics and pins are intentionally dropped.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        debug!(%policy, capacity = self.capacity, "replacing cache core for policy change");
        self.policy = policy;
        self.inner = PolicyCore::new(policy, self.capacity);
    }

    /// Replaces the core with a fresh empty one of `capacity` entries.
    /// Entries, statistics and pins are intentionally dropped.
    pub fn resize(&mut self, capacity: usize) {
        debug!(policy = %self.policy, capacity, "replacing cache core for resize");
        self.capacity = capacity;
        self.inner = PolicyCore::new(self.policy, capacity);
    }

    /// Preloads entries through the prefetch path, so warmed data never
    /// skews hit/miss accounting.
    pub fn warmup(&mut self, data: Vec<(K, V)>) {
        for (key, value) in data {
            self.inner.prefetch(key, value);
        }
    }

    // -- analytics --------------------------------------------------------

    pub fn statistics(&self) -> CacheStatistics {
        self.inner.statistics()
    }

    pub fn reset_statistics(&mut self) {
        self.inner.reset_statistics()
    }

    /// Up to `count` resident keys by descending access count. Ties keep the
    /// policy's deterministic order-index order (stable sort), so the result
    /// is stable for a given state.
    pub fn hot_keys(&self, count: usize) -> Vec<K> {
        let mut snapshots = self.inner.entry_snapshots();
        snapshots.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        snapshots.truncate(count);
        snapshots.into_iter().map(|snap| snap.key).collect()
    }

    /// Like [`hot_keys`](Self::hot_keys) but with the full per-entry detail.
    pub fn hot_entry_details(&self, count: usize) -> Vec<HotEntryInfo<K>> {
        let mut snapshots = self.inner.entry_snapshots();
        snapshots.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        snapshots.truncate(count);
        snapshots
            .into_iter()
            .map(|snap| {
                let age = snap.created_at.elapsed().unwrap_or_default();
                let secs = age.as_secs_f64();
                HotEntryInfo {
                    access_count: snap.access_count,
                    last_accessed: snap.last_accessed,
                    age_in_cache: age,
                    pinned: snap.pinned,
                    access_frequency: if secs > 0.0 {
                        snap.access_count as f64 / secs
                    } else {
                        0.0
                    },
                    key: snap.key,
                }
            })
            .collect()
    }

    /// Appends a sample to `key`'s access history (last hour, last 100
    /// samples per key).
    pub fn track_access(&mut self, key: &K) {
        self.history.record(key);
    }

    /// Windowed access rate for `key`, once at least 5 samples span a
    /// positive interval.
    pub fn access_rate(&mut self, key: &K) -> Option<f64> {
        self.history.rate(key)
    }

    /// Whether `key`'s tracked rate exceeds [`HOT_ACCESS_RATE`].
    pub fn is_hot_key(&mut self, key: &K) -> bool {
        self.access_rate(key).is_some_and(|rate| rate > HOT_ACCESS_RATE)
    }

    /// Raises an advisory when the hit rate has stayed under 50% across more
    /// than 100 accesses. Advisory only: the policy is never switched here.
    pub fn optimize_for_workload(&self) -> Option<WorkloadAdvice> {
        let stats = self.inner.statistics();
        if stats.total_accesses > ADVISORY_MIN_ACCESSES && stats.hit_rate < ADVISORY_HIT_RATE_FLOOR
        {
            let advice = WorkloadAdvice {
                policy: self.policy,
                hit_rate: stats.hit_rate,
                total_accesses: stats.total_accesses,
            };
            info!(
                policy = %advice.policy,
                hit_rate = advice.hit_rate,
                total_accesses = advice.total_accesses,
                "cache hit rate is low for this workload; consider another policy or a larger capacity"
            );
            Some(advice)
        } else {
            None
        }
    }
}
