//! Cache entry record.
//!
//! One [`CacheEntry`] per resident key: the value plus the access metadata
//! (counter, wall-clock creation and last-access stamps, pin bit) that the
//! analytics surface reports. Entries are owned by exactly one cache and are
//! created on first `put`/`prefetch`, mutated on every `get`, value update
//! and pin change, and destroyed on `remove`, eviction, or `clear`.

use std::time::{Duration, SystemTime};

/// A resident key/value pair with access metadata.
///
/// Timestamps are wall-clock (`SystemTime`): sufficient for analytics, not
/// meant for ordering across processes.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    /// Number of `get` hits on this entry. Value updates do not count.
    pub access_count: u64,
    pub created_at: SystemTime,
    pub last_accessed: SystemTime,
    /// Mirrors membership in the owning cache's pinned set.
    pub pinned: bool,
}

impl<K, V> CacheEntry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        let now = SystemTime::now();
        Self {
            key,
            value,
            access_count: 0,
            created_at: now,
            last_accessed: now,
            pinned: false,
        }
    }

    /// Records a read hit: bumps the access counter and the last-access stamp.
    #[inline]
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed = SystemTime::now();
    }

    /// Records a value update: refreshes the last-access stamp only. The
    /// access counter tracks reads, not writes.
    #[inline]
    pub fn touch(&mut self) {
        self.last_accessed = SystemTime::now();
    }

    /// Time since the entry was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed().unwrap_or(Duration::ZERO)
    }

    /// Lifetime accesses per second. Entries younger than the clock
    /// resolution report 0.0 rather than a spike.
    pub fn access_frequency(&self) -> f64 {
        let secs = self.age().as_secs_f64();
        if secs > 0.0 {
            self.access_count as f64 / secs
        } else {
            0.0
        }
    }
}

/// Access metadata copied out of an entry for analytics queries.
///
/// Snapshots carry no value, so they are cheap to collect for every resident
/// entry in hot-key scans.
#[derive(Debug, Clone)]
pub struct EntrySnapshot<K> {
    pub key: K,
    pub access_count: u64,
    pub created_at: SystemTime,
    pub last_accessed: SystemTime,
    pub pinned: bool,
}

impl<K: Clone, V> CacheEntry<K, V> {
    pub fn snapshot(&self) -> EntrySnapshot<K> {
        EntrySnapshot {
            key: self.key.clone(),
            access_count: self.access_count,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            pinned: self.pinned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_starts_unpinned_with_zero_accesses() {
        let entry = CacheEntry::new("k", 42);
        assert_eq!(entry.access_count, 0);
        assert!(!entry.pinned);
        assert_eq!(entry.created_at, entry.last_accessed);
    }

    #[test]
    fn record_access_bumps_counter_and_stamp() {
        let mut entry = CacheEntry::new("k", 42);
        let created = entry.last_accessed;
        std::thread::sleep(Duration::from_millis(2));
        entry.record_access();
        entry.record_access();
        assert_eq!(entry.access_count, 2);
        assert!(entry.last_accessed > created);
    }

    #[test]
    fn touch_does_not_count_as_access() {
        let mut entry = CacheEntry::new("k", 1);
        entry.touch();
        assert_eq!(entry.access_count, 0);
    }

    #[test]
    fn snapshot_copies_metadata() {
        let mut entry = CacheEntry::new("k".to_string(), vec![1u8, 2]);
        entry.record_access();
        entry.pinned = true;

        let snap = entry.snapshot();
        assert_eq!(snap.key, "k");
        assert_eq!(snap.access_count, 1);
        assert!(snap.pinned);
    }

    #[test]
    fn access_frequency_is_finite() {
        let mut entry = CacheEntry::new("k", 0u8);
        for _ in 0..10 {
            entry.record_access();
        }
        let freq = entry.access_frequency();
        assert!(freq.is_finite());
        assert!(freq >= 0.0);
    }
}
