//! # Uniform cache contract
//!
//! Every eviction discipline presents the same operation set through
//! [`PolicyCache`]; the policies differ only in which entry becomes the
//! eviction victim and whether `get`/`put` reorder the index.
//!
//! ## Contract Summary
//!
//! | Op            | Statistics effect          | Notes                                     |
//! |---------------|----------------------------|-------------------------------------------|
//! | `put`         | none (evictions aside)     | update keeps `access_count`, refreshes last-access; insert may evict once |
//! | `get`         | hit or miss                | returns the value by clone; reorders per policy |
//! | `contains`    | none                       | pure lookup                               |
//! | `remove`      | none                       | idempotent; erases order-index and pin state |
//! | `clear`       | none                       | statistics survive a clear                |
//! | `pin`/`unpin` | none                       | pin on a missing key is a silent no-op    |
//! | `prefetch`    | `prefetched_items` only    | never counts as hit or miss               |
//! | `statistics`  | none                       | snapshot; gauges filled at read time      |
//!
//! ## Eviction and pinning
//!
//! Eviction never removes a pinned entry while any unpinned entry is
//! resident. When the cache is full and every entry is pinned, the incoming
//! insert is refused silently: inserts happen only after a successful
//! eviction on a full cache.
//!
//! ## Why values are cloned
//!
//! Values are treated as cheaply copyable blobs (file contents for the
//! filesystem layer). Returning clones keeps the caches free of lifetime
//! entanglement with their callers; a zero-copy handle variant is a possible
//! extension, not part of this contract.

use crate::entry::EntrySnapshot;
use crate::error::CacheError;
use crate::stats::CacheStatistics;

/// Operations every single-policy cache supports.
///
/// # Type Parameters
///
/// - `K`: key, `Eq + Hash + Clone` in all implementations
/// - `V`: value, `Clone` (return-by-value contract)
///
/// # Example
///
/// ```
/// use vfscache::policy::lru::LruCore;
/// use vfscache::traits::PolicyCache;
///
/// fn warm<C: PolicyCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.prefetch(*key, value.clone());
///     }
/// }
///
/// let mut cache = LruCore::new(100);
/// warm(&mut cache, &[(1, "one".into()), (2, "two".into())]);
/// assert_eq!(cache.len(), 2);
/// assert_eq!(cache.statistics().prefetched_items, 2);
/// ```
pub trait PolicyCache<K, V> {
    /// Inserts or updates a key.
    ///
    /// Updates refresh the value and last-access stamp without touching the
    /// access counter, then reorder per policy. Fresh inserts on a full
    /// cache evict exactly once; if no unpinned victim exists the insert is
    /// silently refused.
    fn put(&mut self, key: K, value: V);

    /// Looks a key up, counting a hit or a miss and reordering per policy.
    ///
    /// Returns the value by clone, or [`CacheError::NotFound`].
    fn get(&mut self, key: &K) -> Result<V, CacheError>;

    /// Existence check with no statistics or ordering effect.
    fn contains(&self, key: &K) -> bool;

    /// Removes a key if present. Idempotent.
    fn remove(&mut self, key: &K);

    /// Drops every entry, order-index position, and pin. Statistics are
    /// intentionally untouched.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Marks a resident key ineligible for eviction. No-op when absent.
    fn pin(&mut self, key: &K);

    /// Removes eviction protection. Idempotent.
    fn unpin(&mut self, key: &K);

    fn is_pinned(&self, key: &K) -> bool;

    /// Anticipatory insert: behaves like [`put`](Self::put) but bumps
    /// `prefetched_items` instead of touching hit/miss accounting.
    fn prefetch(&mut self, key: K, value: V);

    /// Snapshot of the resident keys in the policy's deterministic
    /// order-index order.
    fn keys(&self) -> Vec<K>;

    /// Statistics snapshot with the pinned/size gauges filled at read time.
    fn statistics(&self) -> CacheStatistics;

    /// Zeroes counters and stamps the reset time. Entries and pins survive.
    fn reset_statistics(&mut self);

    /// Access metadata for every resident entry, in the same deterministic
    /// order as [`keys`](Self::keys).
    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>>;
}
