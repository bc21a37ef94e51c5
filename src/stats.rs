//! Cache statistics counters and snapshots.
//!
//! Every single-policy cache owns one [`CacheStatistics`] and keeps the
//! following arithmetic true at all observable points:
//!
//! | Field              | Rule                                              |
//! |--------------------|---------------------------------------------------|
//! | `total_accesses`   | always `hits + misses`                            |
//! | `hit_rate`         | `hits / max(1, hits + misses) * 100`, recomputed after every hit or miss |
//! | `evictions`        | incremented exactly once per successful eviction  |
//! | `prefetched_items` | monotonic; prefetches never count as hit or miss  |
//!
//! `pinned_items` and `current_size` are gauges captured at snapshot time,
//! not live counters.

use std::time::{Duration, SystemTime};

/// Hit/miss/eviction counters for one cache instance.
///
/// `contains` never touches these counters; `get` is the only operation that
/// records hits and misses.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_accesses: u64,
    /// Number of pinned entries at snapshot time.
    pub pinned_items: usize,
    pub prefetched_items: u64,
    /// Number of resident entries at snapshot time.
    pub current_size: usize,
    /// Hit percentage in `[0, 100]`.
    pub hit_rate: f64,
    pub last_reset: SystemTime,
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            evictions: 0,
            total_accesses: 0,
            pinned_items: 0,
            prefetched_items: 0,
            current_size: 0,
            hit_rate: 0.0,
            last_reset: SystemTime::now(),
        }
    }

    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.update_hit_rate();
    }

    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.update_hit_rate();
    }

    #[inline]
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    #[inline]
    pub fn record_prefetch(&mut self) {
        self.prefetched_items += 1;
    }

    #[inline]
    fn update_hit_rate(&mut self) {
        self.total_accesses = self.hits + self.misses;
        self.hit_rate = (self.hits as f64 / self.total_accesses.max(1) as f64) * 100.0;
    }

    /// Zeroes all counters and stamps `last_reset`. Entries and pinning are
    /// untouched by a statistics reset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns a copy with the snapshot-time gauges filled in.
    pub fn snapshot(&self, pinned_items: usize, current_size: usize) -> Self {
        let mut out = self.clone();
        out.pinned_items = pinned_items;
        out.current_size = current_size;
        out
    }

    /// Folds another instance's counters into this one. Used to aggregate
    /// per-shard snapshots; the combined `hit_rate` is recomputed and
    /// `last_reset` keeps the earliest reset point.
    pub fn merge(&mut self, other: &CacheStatistics) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.evictions += other.evictions;
        self.prefetched_items += other.prefetched_items;
        self.pinned_items += other.pinned_items;
        self.current_size += other.current_size;
        if other.last_reset < self.last_reset {
            self.last_reset = other.last_reset;
        }
        self.update_hit_rate();
    }
}

impl Default for CacheStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-entry access detail for hot-entry analytics.
#[derive(Debug, Clone)]
pub struct HotEntryInfo<K> {
    pub key: K,
    pub access_count: u64,
    pub last_accessed: SystemTime,
    /// Time since the entry was created.
    pub age_in_cache: Duration,
    pub pinned: bool,
    /// Lifetime accesses per second, 0.0 for entries younger than the clock
    /// resolution.
    pub access_frequency: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_statistics_are_zeroed() {
        let stats = CacheStatistics::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_accesses, 0);
        assert_eq!(stats.prefetched_items, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn hit_rate_tracks_hits_and_misses() {
        let mut stats = CacheStatistics::new();
        stats.record_hit();
        assert_eq!(stats.hit_rate, 100.0);

        stats.record_miss();
        assert_eq!(stats.total_accesses, 2);
        assert_eq!(stats.hit_rate, 50.0);

        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.total_accesses, 4);
        assert_eq!(stats.hit_rate, 25.0);
    }

    #[test]
    fn total_accesses_equals_hits_plus_misses() {
        let mut stats = CacheStatistics::new();
        for _ in 0..7 {
            stats.record_hit();
        }
        for _ in 0..3 {
            stats.record_miss();
        }
        assert_eq!(stats.total_accesses, stats.hits + stats.misses);
        assert_eq!(stats.total_accesses, 10);
    }

    #[test]
    fn prefetch_does_not_touch_hit_rate() {
        let mut stats = CacheStatistics::new();
        stats.record_prefetch();
        stats.record_prefetch();
        assert_eq!(stats.prefetched_items, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn reset_zeroes_counters_and_bumps_timestamp() {
        let mut stats = CacheStatistics::new();
        stats.record_hit();
        stats.record_eviction();
        stats.record_prefetch();
        let before = stats.last_reset;

        std::thread::sleep(std::time::Duration::from_millis(2));
        stats.reset();

        assert_eq!(stats.hits, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.prefetched_items, 0);
        assert!(stats.last_reset > before);
    }

    #[test]
    fn snapshot_fills_gauges() {
        let mut stats = CacheStatistics::new();
        stats.record_hit();
        let snap = stats.snapshot(3, 17);
        assert_eq!(snap.pinned_items, 3);
        assert_eq!(snap.current_size, 17);
        assert_eq!(snap.hits, 1);
        // the live counters keep their zero gauges
        assert_eq!(stats.pinned_items, 0);
    }

    #[test]
    fn merge_sums_counters_and_recomputes_rate() {
        let mut a = CacheStatistics::new();
        a.record_hit();
        a.record_hit();
        let mut b = CacheStatistics::new();
        b.record_miss();
        b.record_miss();
        b.record_eviction();

        let mut combined = a.snapshot(1, 2);
        combined.merge(&b.snapshot(0, 5));

        assert_eq!(combined.hits, 2);
        assert_eq!(combined.misses, 2);
        assert_eq!(combined.evictions, 1);
        assert_eq!(combined.total_accesses, 4);
        assert_eq!(combined.hit_rate, 50.0);
        assert_eq!(combined.pinned_items, 1);
        assert_eq!(combined.current_size, 7);
    }
}
