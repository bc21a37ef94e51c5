//! # Sharded concurrent cache manager
//!
//! N independent [`CacheManager`] shards selected by `hash(key) mod N`, each
//! behind its own `parking_lot::RwLock`, with synchronous and asynchronous
//! surfaces.
//!
//! ## Architecture
//!
//! ```text
//!                       ┌──────────────────────────────────────┐
//!    put/get/... ─────► │      ConcurrentCacheManager          │
//!    *_async ──► pool ─►│                                      │
//!                       │  selector: hash(key) mod N           │
//!                       │        │                             │
//!                       │        ▼                             │
//!                       │  ┌───────────┬───────────┬────────┐  │
//!                       │  │ RwLock    │ RwLock    │  ...   │  │
//!                       │  │ shard 0   │ shard 1   │        │  │
//!                       │  └───────────┴───────────┴────────┘  │
//!                       │                                      │
//!                       │  async stats: atomics                │
//!                       │  background: optimize / cleanup      │
//!                       └──────────────────────────────────────┘
//! ```
//!
//! ## Locking rules
//!
//! - `get` takes the **write** lock: it is logically mutating (statistics
//!   and, for LRU/LFU, the order index) even though callers think of it as a
//!   read. `contains`/`is_pinned` take the read lock.
//! - No lock is held across a suspension point; async tasks acquire their
//!   shard's lock inside the worker.
//! - Operations on the same key are linearizable through the shard lock;
//!   there is no ordering promise across shards, and aggregated statistics
//!   combine per-shard snapshots taken at different instants.
//!
//! ## Background workers
//!
//! Two optional workers, each a dedicated thread with a stop signal: a
//! fixed-interval optimization pass and a caller-scheduled periodic cleanup.
//! Both walk the shards applying the workload advisory check; neither ever
//! switches a policy. Panics inside a pass are logged and the worker
//! continues.

use parking_lot::{Condvar, Mutex, RwLock};
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::concurrent::pool::{TaskHandle, WorkerPool, default_worker_count};
use crate::ds::shard::ShardSelector;
use crate::error::CacheError;
use crate::manager::CacheManager;
use crate::policy::CachePolicy;
use crate::stats::{CacheStatistics, HotEntryInfo};

/// Wake period of the background optimization worker.
const OPTIMIZATION_INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Async-operation statistics
// ---------------------------------------------------------------------------

/// Point-in-time view of the async-operation counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcurrentStatsSnapshot {
    pub total_async: u64,
    pub completed_async: u64,
    pub failed_async: u64,
    /// Running average latency of finished async operations.
    pub average_latency: Duration,
}

impl ConcurrentStatsSnapshot {
    /// Percentage of submitted operations that completed successfully.
    pub fn completion_rate(&self) -> f64 {
        if self.total_async > 0 {
            (self.completed_async as f64 / self.total_async as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Percentage of submitted operations that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.total_async > 0 {
            (self.failed_async as f64 / self.total_async as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
struct AsyncStats {
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    latency_micros: AtomicU64,
}

impl AsyncStats {
    fn record_submit(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_finish(&self, elapsed: Duration, ok: bool) {
        self.latency_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        if ok {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> ConcurrentStatsSnapshot {
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let finished = completed + failed;
        let average_latency = if finished > 0 {
            Duration::from_micros(self.latency_micros.load(Ordering::Relaxed) / finished)
        } else {
            Duration::ZERO
        };
        ConcurrentStatsSnapshot {
            total_async: self.total.load(Ordering::Relaxed),
            completed_async: completed,
            failed_async: failed,
            average_latency,
        }
    }

    fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.latency_micros.store(0, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Background worker plumbing
// ---------------------------------------------------------------------------

struct StopSignal {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl StopSignal {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            stopped: Mutex::new(false),
            cv: Condvar::new(),
        })
    }

    /// Sleeps up to `timeout`; returns `true` once the signal fired.
    fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if *stopped {
            return true;
        }
        self.cv.wait_for(&mut stopped, timeout);
        *stopped
    }

    fn trigger(&self) {
        *self.stopped.lock() = true;
        self.cv.notify_all();
    }
}

struct BackgroundWorker {
    signal: Arc<StopSignal>,
    handle: JoinHandle<()>,
}

impl BackgroundWorker {
    fn stop(self) {
        self.signal.trigger();
        let _ = self.handle.join();
    }
}

// ---------------------------------------------------------------------------
// Shared shard state
// ---------------------------------------------------------------------------

struct Shared<K, V>
where
    K: Eq + Hash + Clone,
{
    shards: Vec<RwLock<CacheManager<K, V>>>,
    selector: ShardSelector,
    stats: AsyncStats,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn shard(&self, key: &K) -> &RwLock<CacheManager<K, V>> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    /// One advisory pass over every shard. Read lock only: the check never
    /// mutates.
    fn advisory_pass(&self) {
        for shard in &self.shards {
            let _ = shard.read().optimize_for_workload();
        }
    }
}

// ---------------------------------------------------------------------------
// ConcurrentCacheManager
// ---------------------------------------------------------------------------

/// Sharded, thread-safe cache manager with sync and async surfaces.
pub struct ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    shared: Arc<Shared<K, V>>,
    pool: Arc<WorkerPool>,
    optimization: Option<BackgroundWorker>,
    cleanup: Option<BackgroundWorker>,
}

impl<K, V> ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a manager with `shard_count` shards (clamped to ≥ 1) and the
    /// default-sized worker pool. Per-shard capacity is
    /// `max(1, total_capacity / shard_count)`.
    pub fn new(total_capacity: usize, policy: CachePolicy, shard_count: usize) -> Self {
        Self::with_workers(total_capacity, policy, shard_count, default_worker_count())
    }

    /// Like [`new`](Self::new) with an explicit worker-pool size.
    pub fn with_workers(
        total_capacity: usize,
        policy: CachePolicy,
        shard_count: usize,
        workers: usize,
    ) -> Self {
        let shard_count = shard_count.max(1);
        let per_shard = (total_capacity / shard_count).max(1);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(CacheManager::new(per_shard, policy)))
            .collect();

        Self {
            shared: Arc::new(Shared {
                shards,
                selector: ShardSelector::new(shard_count),
                stats: AsyncStats::default(),
            }),
            pool: Arc::new(WorkerPool::new(workers)),
            optimization: None,
            cleanup: None,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shared.shards.len()
    }

    /// The pool driving the async surface.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    // -- synchronous operations ------------------------------------------

    pub fn put(&self, key: K, value: V) {
        self.shared.shard(&key).write().put(key, value);
    }

    /// Write lock: a hit updates statistics and the eviction order.
    pub fn get(&self, key: &K) -> Result<V, CacheError> {
        self.shared.shard(key).write().get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shared.shard(key).read().contains(key)
    }

    pub fn remove(&self, key: &K) {
        self.shared.shard(key).write().remove(key);
    }

    pub fn pin(&self, key: &K) {
        self.shared.shard(key).write().pin(key);
    }

    pub fn unpin(&self, key: &K) {
        self.shared.shard(key).write().unpin(key);
    }

    pub fn is_pinned(&self, key: &K) -> bool {
        self.shared.shard(key).read().is_pinned(key)
    }

    pub fn prefetch(&self, key: K, value: V) {
        self.shared.shard(&key).write().prefetch(key, value);
    }

    pub fn track_access(&self, key: &K) {
        self.shared.shard(key).write().track_access(key);
    }

    /// Clears every shard, taking the write locks in fixed index order.
    pub fn clear(&self) {
        for shard in &self.shared.shards {
            shard.write().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.shared.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<K> {
        self.shared
            .shards
            .iter()
            .flat_map(|shard| shard.read().keys())
            .collect()
    }

    pub fn warmup(&self, data: Vec<(K, V)>) {
        for (key, value) in data {
            self.shared.shard(&key).write().prefetch(key, value);
        }
    }

    // -- reconfiguration (destructive, like the single-shard manager) ----

    pub fn policy(&self) -> CachePolicy {
        self.shared.shards[0].read().policy()
    }

    pub fn set_policy(&self, policy: CachePolicy) {
        for shard in &self.shared.shards {
            shard.write().set_policy(policy);
        }
    }

    pub fn resize(&self, total_capacity: usize) {
        let per_shard = (total_capacity / self.shard_count()).max(1);
        for shard in &self.shared.shards {
            shard.write().resize(per_shard);
        }
    }

    // -- analytics --------------------------------------------------------

    /// Aggregated statistics. Per-shard snapshots are coherent; the
    /// aggregate combines snapshots taken at slightly different instants.
    pub fn statistics(&self) -> CacheStatistics {
        let mut combined = CacheStatistics::new();
        for shard in &self.shared.shards {
            combined.merge(&shard.read().statistics());
        }
        combined
    }

    pub fn shard_statistics(&self) -> Vec<CacheStatistics> {
        self.shared
            .shards
            .iter()
            .map(|shard| shard.read().statistics())
            .collect()
    }

    pub fn reset_statistics(&self) {
        for shard in &self.shared.shards {
            shard.write().reset_statistics();
        }
    }

    /// Up to `count` keys across all shards, ranked by access count.
    pub fn hot_keys(&self, count: usize) -> Vec<K> {
        self.hot_entry_details(count)
            .into_iter()
            .map(|info| info.key)
            .collect()
    }

    pub fn hot_entry_details(&self, count: usize) -> Vec<HotEntryInfo<K>> {
        let mut details: Vec<HotEntryInfo<K>> = self
            .shared
            .shards
            .iter()
            .flat_map(|shard| shard.read().hot_entry_details(count))
            .collect();
        details.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        details.truncate(count);
        details
    }

    pub fn concurrent_stats(&self) -> ConcurrentStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn reset_concurrent_stats(&self) {
        self.shared.stats.reset();
    }

    pub fn background_optimization_running(&self) -> bool {
        self.optimization.is_some()
    }

    pub fn periodic_cleanup_running(&self) -> bool {
        self.cleanup.is_some()
    }
}

// ---------------------------------------------------------------------------
// Background workers
// ---------------------------------------------------------------------------

impl<K, V> ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Starts the fixed-interval advisory worker. Idempotent.
    pub fn start_background_optimization(&mut self) {
        if self.optimization.is_some() {
            return;
        }
        self.optimization = Some(Self::spawn_advisory_worker(
            Arc::clone(&self.shared),
            OPTIMIZATION_INTERVAL,
            "vfscache-optimize",
        ));
    }

    /// Stops the advisory worker. Idempotent.
    pub fn stop_background_optimization(&mut self) {
        if let Some(worker) = self.optimization.take() {
            worker.stop();
            info!("background optimization worker stopped");
        }
    }

    /// Starts a cleanup worker that wakes every `interval`, walks the shards
    /// and applies the workload advisory check. Idempotent.
    pub fn schedule_periodic_cleanup(&mut self, interval: Duration) {
        if self.cleanup.is_some() {
            return;
        }
        self.cleanup = Some(Self::spawn_advisory_worker(
            Arc::clone(&self.shared),
            interval,
            "vfscache-cleanup",
        ));
    }

    /// Stops the periodic cleanup worker. Idempotent.
    pub fn stop_periodic_cleanup(&mut self) {
        if let Some(worker) = self.cleanup.take() {
            worker.stop();
            info!("periodic cleanup worker stopped");
        }
    }

    fn spawn_advisory_worker(
        shared: Arc<Shared<K, V>>,
        interval: Duration,
        name: &str,
    ) -> BackgroundWorker {
        let signal = StopSignal::new();
        let thread_signal = Arc::clone(&signal);
        let thread_name = name.to_string();
        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                info!(worker = %thread_name, "background worker started");
                while !thread_signal.wait_timeout(interval) {
                    if catch_unwind(AssertUnwindSafe(|| shared.advisory_pass())).is_err() {
                        error!(worker = %thread_name, "background pass panicked; continuing");
                    }
                }
            })
            .expect("failed to spawn background worker");
        BackgroundWorker { signal, handle }
    }
}

// ---------------------------------------------------------------------------
// Asynchronous surface
// ---------------------------------------------------------------------------

impl<K, V> ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Submits a tracked async operation: counted on submit, its success,
    /// failure and latency recorded when the worker finishes it. Panics are
    /// converted to [`CacheError::AsyncFailure`] so the worker survives.
    fn submit_tracked<T, F>(&self, op: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&Shared<K, V>) -> Result<T, CacheError> + Send + 'static,
    {
        self.shared.stats.record_submit();
        let shared = Arc::clone(&self.shared);
        self.pool.submit(move || {
            let start = Instant::now();
            let result = match catch_unwind(AssertUnwindSafe(|| op(&shared))) {
                Ok(result) => result,
                Err(_) => {
                    error!("async cache task panicked");
                    Err(CacheError::AsyncFailure("task panicked".to_string()))
                },
            };
            shared.stats.record_finish(start.elapsed(), result.is_ok());
            result
        })
    }

    pub fn put_async(&self, key: K, value: V) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            shared.shard(&key).write().put(key, value);
            Ok(())
        })
    }

    /// A miss surfaces through the handle as [`CacheError::NotFound`] and is
    /// counted in `failed_async`.
    pub fn get_async(&self, key: K) -> TaskHandle<V> {
        self.submit_tracked(move |shared| shared.shard(&key).write().get(&key))
    }

    pub fn contains_async(&self, key: K) -> TaskHandle<bool> {
        self.submit_tracked(move |shared| Ok(shared.shard(&key).read().contains(&key)))
    }

    pub fn remove_async(&self, key: K) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            shared.shard(&key).write().remove(&key);
            Ok(())
        })
    }

    pub fn pin_async(&self, key: K) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            shared.shard(&key).write().pin(&key);
            Ok(())
        })
    }

    pub fn unpin_async(&self, key: K) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            shared.shard(&key).write().unpin(&key);
            Ok(())
        })
    }

    pub fn is_pinned_async(&self, key: K) -> TaskHandle<bool> {
        self.submit_tracked(move |shared| Ok(shared.shard(&key).read().is_pinned(&key)))
    }

    pub fn prefetch_async(&self, key: K, value: V) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            shared.shard(&key).write().prefetch(key, value);
            Ok(())
        })
    }

    /// One task performing every put in sequence across the shards involved.
    /// Not atomic: a concurrent reader can observe a prefix of the batch.
    pub fn put_batch_async(&self, items: Vec<(K, V)>) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            for (key, value) in items {
                shared.shard(&key).write().put(key, value);
            }
            Ok(())
        })
    }

    /// Values in input order; missing keys come back as per-item `None`
    /// sentinels rather than failing the whole batch.
    pub fn get_batch_async(&self, keys: Vec<K>) -> TaskHandle<Vec<Option<V>>> {
        self.submit_tracked(move |shared| {
            Ok(keys
                .into_iter()
                .map(|key| shared.shard(&key).write().get(&key).ok())
                .collect())
        })
    }

    pub fn remove_batch_async(&self, keys: Vec<K>) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            for key in keys {
                shared.shard(&key).write().remove(&key);
            }
            Ok(())
        })
    }

    /// Preloads the batch through each element's shard, grouped so every
    /// shard lock is taken once.
    pub fn warmup_async(&self, data: Vec<(K, V)>) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            let mut per_shard: Vec<Vec<(K, V)>> =
                (0..shared.shards.len()).map(|_| Vec::new()).collect();
            for (key, value) in data {
                per_shard[shared.selector.shard_for_key(&key)].push((key, value));
            }
            for (idx, batch) in per_shard.into_iter().enumerate() {
                if !batch.is_empty() {
                    shared.shards[idx].write().warmup(batch);
                }
            }
            Ok(())
        })
    }

    pub fn statistics_async(&self) -> TaskHandle<CacheStatistics> {
        self.submit_tracked(move |shared| {
            let mut combined = CacheStatistics::new();
            for shard in &shared.shards {
                combined.merge(&shard.read().statistics());
            }
            Ok(combined)
        })
    }

    pub fn hot_keys_async(&self, count: usize) -> TaskHandle<Vec<K>> {
        self.submit_tracked(move |shared| {
            let mut details: Vec<HotEntryInfo<K>> = shared
                .shards
                .iter()
                .flat_map(|shard| shard.read().hot_entry_details(count))
                .collect();
            details.sort_by(|a, b| b.access_count.cmp(&a.access_count));
            details.truncate(count);
            Ok(details.into_iter().map(|info| info.key).collect())
        })
    }

    pub fn reset_statistics_async(&self) -> TaskHandle<()> {
        self.submit_tracked(move |shared| {
            for shard in &shared.shards {
                shard.write().reset_statistics();
            }
            Ok(())
        })
    }
}

impl<K, V> Drop for ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        if let Some(worker) = self.optimization.take() {
            worker.stop();
        }
        if let Some(worker) = self.cleanup.take() {
            worker.stop();
        }
    }
}

impl<K, V> std::fmt::Debug for ConcurrentCacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentCacheManager")
            .field("shards", &self.shard_count())
            .field("optimization", &self.optimization.is_some())
            .field("cleanup", &self.cleanup.is_some())
            .finish_non_exhaustive()
    }
}
