//! Eviction policies and the policy-tagged dispatch core.

pub mod fifo;
pub mod lfu;
pub mod lifo;
pub mod lru;

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::entry::EntrySnapshot;
use crate::error::CacheError;
use crate::stats::CacheStatistics;
use crate::traits::PolicyCache;

use fifo::FifoCore;
use lfu::LfuCore;
use lifo::LifoCore;
use lru::LruCore;

/// Available eviction disciplines.
///
/// The CLI wire form round-trips through `FromStr`/`Display` using the tags
/// `LRU | LFU | FIFO | LIFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Least Recently Used: evicts from the cold end of the recency list.
    Lru,
    /// Least Frequently Used: evicts the lowest-frequency, oldest entry.
    Lfu,
    /// First In, First Out: evicts in arrival order; reads do not reorder.
    Fifo,
    /// Last In, First Out: evicts the most recent arrival first.
    Lifo,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            CachePolicy::Lru => "LRU",
            CachePolicy::Lfu => "LFU",
            CachePolicy::Fifo => "FIFO",
            CachePolicy::Lifo => "LIFO",
        };
        f.write_str(tag)
    }
}

impl FromStr for CachePolicy {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LRU" => Ok(CachePolicy::Lru),
            "LFU" => Ok(CachePolicy::Lfu),
            "FIFO" => Ok(CachePolicy::Fifo),
            "LIFO" => Ok(CachePolicy::Lifo),
            other => Err(crate::error::ConfigError::new(format!(
                "unknown cache policy tag: {other:?} (expected LRU, LFU, FIFO or LIFO)"
            ))),
        }
    }
}

/// Policy sum type: one structure holding whichever concrete core the active
/// policy requires, dispatching the uniform contract to it.
#[derive(Debug)]
pub enum PolicyCore<K, V>
where
    K: Eq + Hash + Clone,
{
    Lru(LruCore<K, V>),
    Lfu(LfuCore<K, V>),
    Fifo(FifoCore<K, V>),
    Lifo(LifoCore<K, V>),
}

impl<K, V> PolicyCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty core for `policy` with the given capacity.
    pub fn new(policy: CachePolicy, capacity: usize) -> Self {
        match policy {
            CachePolicy::Lru => PolicyCore::Lru(LruCore::new(capacity)),
            CachePolicy::Lfu => PolicyCore::Lfu(LfuCore::new(capacity)),
            CachePolicy::Fifo => PolicyCore::Fifo(FifoCore::new(capacity)),
            CachePolicy::Lifo => PolicyCore::Lifo(LifoCore::new(capacity)),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        match self {
            PolicyCore::Lru(_) => CachePolicy::Lru,
            PolicyCore::Lfu(_) => CachePolicy::Lfu,
            PolicyCore::Fifo(_) => CachePolicy::Fifo,
            PolicyCore::Lifo(_) => CachePolicy::Lifo,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $core:ident => $body:expr) => {
        match $self {
            PolicyCore::Lru($core) => $body,
            PolicyCore::Lfu($core) => $body,
            PolicyCore::Fifo($core) => $body,
            PolicyCore::Lifo($core) => $body,
        }
    };
}

impl<K, V> PolicyCache<K, V> for PolicyCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) {
        dispatch!(self, core => core.put(key, value))
    }

    fn get(&mut self, key: &K) -> Result<V, CacheError> {
        dispatch!(self, core => core.get(key))
    }

    fn contains(&self, key: &K) -> bool {
        dispatch!(self, core => core.contains(key))
    }

    fn remove(&mut self, key: &K) {
        dispatch!(self, core => core.remove(key))
    }

    fn clear(&mut self) {
        dispatch!(self, core => core.clear())
    }

    fn len(&self) -> usize {
        dispatch!(self, core => core.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, core => core.capacity())
    }

    fn pin(&mut self, key: &K) {
        dispatch!(self, core => core.pin(key))
    }

    fn unpin(&mut self, key: &K) {
        dispatch!(self, core => core.unpin(key))
    }

    fn is_pinned(&self, key: &K) -> bool {
        dispatch!(self, core => core.is_pinned(key))
    }

    fn prefetch(&mut self, key: K, value: V) {
        dispatch!(self, core => core.prefetch(key, value))
    }

    fn keys(&self) -> Vec<K> {
        dispatch!(self, core => core.keys())
    }

    fn statistics(&self) -> CacheStatistics {
        dispatch!(self, core => core.statistics())
    }

    fn reset_statistics(&mut self) {
        dispatch!(self, core => core.reset_statistics())
    }

    fn entry_snapshots(&self) -> Vec<EntrySnapshot<K>> {
        dispatch!(self, core => core.entry_snapshots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_tags_round_trip() {
        for policy in [
            CachePolicy::Lru,
            CachePolicy::Lfu,
            CachePolicy::Fifo,
            CachePolicy::Lifo,
        ] {
            let tag = policy.to_string();
            assert_eq!(tag.parse::<CachePolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "MRU".parse::<CachePolicy>().unwrap_err();
        assert!(err.message().contains("MRU"));
    }

    #[test]
    fn core_reports_its_policy() {
        for policy in [
            CachePolicy::Lru,
            CachePolicy::Lfu,
            CachePolicy::Fifo,
            CachePolicy::Lifo,
        ] {
            let core: PolicyCore<u64, String> = PolicyCore::new(policy, 8);
            assert_eq!(core.policy(), policy);
            assert_eq!(core.capacity(), 8);
        }
    }

    #[test]
    fn all_policies_share_the_contract() {
        for policy in [
            CachePolicy::Lru,
            CachePolicy::Lfu,
            CachePolicy::Fifo,
            CachePolicy::Lifo,
        ] {
            let mut core: PolicyCore<u64, String> = PolicyCore::new(policy, 4);

            core.put(1, "one".to_string());
            core.put(2, "two".to_string());
            assert_eq!(core.get(&1).unwrap(), "one");
            assert!(core.contains(&2));
            assert_eq!(core.len(), 2);

            core.put(1, "ONE".to_string());
            assert_eq!(core.get(&1).unwrap(), "ONE");
            assert_eq!(core.len(), 2);

            core.pin(&1);
            assert!(core.is_pinned(&1));
            core.unpin(&1);
            assert!(!core.is_pinned(&1));

            core.remove(&1);
            assert!(!core.contains(&1));

            core.clear();
            assert!(core.is_empty());
            // a clear keeps the counters
            assert!(core.statistics().hits >= 1);
        }
    }
}
