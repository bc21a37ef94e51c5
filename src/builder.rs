//! Unified builder for single-shard and sharded cache managers.
//!
//! ## Example
//!
//! ```rust
//! use vfscache::builder::CacheBuilder;
//! use vfscache::policy::CachePolicy;
//!
//! let mut cache = CacheBuilder::new(100)
//!     .policy(CachePolicy::Lfu)
//!     .build::<u64, String>();
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1).unwrap(), "hello");
//! ```

use std::hash::Hash;

use crate::concurrent::manager::ConcurrentCacheManager;
use crate::concurrent::pool::default_worker_count;
use crate::error::ConfigError;
use crate::manager::CacheManager;
use crate::policy::CachePolicy;

/// Builder carrying capacity, policy, and the concurrent-manager knobs.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    policy: CachePolicy,
    shards: usize,
    workers: Option<usize>,
}

impl CacheBuilder {
    /// Starts a builder for a cache of `capacity` entries (LRU by default).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: CachePolicy::Lru,
            shards: 16,
            workers: None,
        }
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shard count for [`build_concurrent`](Self::build_concurrent).
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Worker-pool size for the async surface. Defaults to hardware
    /// parallelism with a floor of 2.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Builds a single-shard manager.
    pub fn build<K, V>(self) -> CacheManager<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        CacheManager::new(self.capacity, self.policy)
    }

    /// Builds a sharded concurrent manager, clamping out-of-range knobs
    /// (0 shards → 1, 0 workers → 1).
    pub fn build_concurrent<K, V>(self) -> ConcurrentCacheManager<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let workers = self.workers.unwrap_or_else(default_worker_count);
        ConcurrentCacheManager::with_workers(self.capacity, self.policy, self.shards, workers)
    }

    /// Builds a sharded concurrent manager, rejecting invalid knobs instead
    /// of clamping them.
    pub fn try_build_concurrent<K, V>(self) -> Result<ConcurrentCacheManager<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        if self.shards == 0 {
            return Err(ConfigError::new("shard count must be > 0"));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::new("worker count must be > 0"));
        }
        Ok(self.build_concurrent())
    }
}
