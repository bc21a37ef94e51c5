//! Key-to-shard routing for the concurrent manager.
//!
//! Every key is routed to `hash(key) mod N`, and the mapping must stay
//! stable for the lifetime of the manager so a key always lands on the shard
//! that owns it. The selector hashes with `FxHasher` (the same hasher the
//! policy cores index with) and folds in a salt derived from the shard count
//! at construction, so two managers with different shapes do not share a key
//! distribution.
//!
//! ```text
//!   "fs/etc/hosts" ──FxHasher──► 0x7c91…  ─┐
//!                                          ├─ xor ──► % N ──► shard 2
//!   salt(N)        ──splitmix───► 0x19af…  ─┘
//! ```

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Routes keys to shard indexes in `[0, shards)`.
///
/// The mapping is a pure function of the key and the selector's shape: the
/// same selector configuration always routes a key to the same shard.
///
/// # Example
///
/// ```
/// use vfscache::ds::ShardSelector;
///
/// let selector = ShardSelector::new(4);
/// let shard = selector.shard_for_key(&"fs/etc/hosts");
/// assert!(shard < 4);
/// assert_eq!(selector.shard_for_key(&"fs/etc/hosts"), shard);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    salt: u64,
}

/// splitmix64 finalizer, used to turn a small integer into a well-mixed salt.
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

impl ShardSelector {
    /// Creates a selector for `shards` shards (clamped to ≥ 1). The salt is
    /// derived from the shard count, so selectors of the same shape agree on
    /// every key.
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards,
            salt: mix64(shards as u64),
        }
    }

    /// Like [`new`](Self::new) with an explicit salt, for callers that want
    /// distribution isolation between same-shaped selectors.
    pub fn with_salt(shards: usize, salt: u64) -> Self {
        Self {
            shards: shards.max(1),
            salt: mix64(salt),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Routes a key to its shard index.
    pub fn shard_for_key<K: Hash>(&self, key: &K) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        let mixed = hasher.finish() ^ self.salt;
        (mixed % self.shards as u64) as usize
    }
}

impl Default for ShardSelector {
    /// Single-shard selector: every key routes to shard 0.
    fn default() -> Self {
        Self::new(1)
    }
}
