// ==============================================
// CONCURRENT MANAGER TESTS (integration)
// ==============================================
//
// Parallel fan-out over the sharded manager: per-shard invariants under
// contention, statistics aggregation against observed counts, the async
// batch surface, and background worker lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use vfscache::builder::CacheBuilder;
use vfscache::concurrent::manager::ConcurrentCacheManager;
use vfscache::error::CacheError;
use vfscache::policy::CachePolicy;

// ==============================================
// Parallel shard stress
// ==============================================

#[test]
fn parallel_mixed_workload_keeps_invariants() {
    const THREADS: usize = 16;
    const OPS_PER_THREAD: usize = 10_000;

    let cache: ConcurrentCacheManager<String, String> =
        ConcurrentCacheManager::with_workers(1000, CachePolicy::Lru, 4, 4);
    let observed_hits = AtomicU64::new(0);
    let observed_misses = AtomicU64::new(0);

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let cache = &cache;
            let observed_hits = &observed_hits;
            let observed_misses = &observed_misses;
            scope.spawn(move || {
                // disjoint key range per thread
                let base = t * OPS_PER_THREAD;
                for i in 0..OPS_PER_THREAD {
                    let key = format!("t{t}-{}", base + (i % 500));
                    if i % 3 == 0 {
                        cache.put(key, "v".to_string());
                    } else {
                        match cache.get(&key) {
                            Ok(_) => {
                                observed_hits.fetch_add(1, Ordering::Relaxed);
                            },
                            Err(CacheError::NotFound) => {
                                observed_misses.fetch_add(1, Ordering::Relaxed);
                            },
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                }
            });
        }
    });

    // per-shard invariants hold after the storm
    for stats in cache.shard_statistics() {
        assert_eq!(stats.total_accesses, stats.hits + stats.misses);
        assert!(stats.current_size <= 250, "shard exceeded its capacity");
    }

    // aggregated accounting matches what the threads observed
    let stats = cache.statistics();
    assert_eq!(stats.hits, observed_hits.load(Ordering::Relaxed));
    assert_eq!(stats.misses, observed_misses.load(Ordering::Relaxed));
    assert_eq!(stats.total_accesses, stats.hits + stats.misses);
}

#[test]
fn concurrent_pinning_protects_entries() {
    let cache: ConcurrentCacheManager<String, String> =
        ConcurrentCacheManager::with_workers(64, CachePolicy::Lru, 4, 2);

    for i in 0..8 {
        cache.put(format!("pinned-{i}"), "keep".to_string());
        cache.pin(&format!("pinned-{i}"));
    }

    std::thread::scope(|scope| {
        for t in 0..8 {
            let cache = &cache;
            scope.spawn(move || {
                for i in 0..2_000 {
                    cache.put(format!("churn-{t}-{i}"), "v".to_string());
                }
            });
        }
    });

    for i in 0..8 {
        assert!(
            cache.contains(&format!("pinned-{i}")),
            "pinned entry was evicted under churn"
        );
    }
}

// ==============================================
// Async surface under parallel submitters
// ==============================================

#[test]
fn async_operations_from_many_threads() {
    let cache: ConcurrentCacheManager<String, String> =
        ConcurrentCacheManager::with_workers(1000, CachePolicy::Lru, 4, 4);

    let handles: Vec<_> = (0..100)
        .map(|i| cache.put_async(format!("k{i}"), format!("v{i}")))
        .collect();
    for handle in handles {
        handle.wait().unwrap();
    }

    let gets: Vec<_> = (0..100).map(|i| cache.get_async(format!("k{i}"))).collect();
    for (i, handle) in gets.into_iter().enumerate() {
        assert_eq!(handle.wait().unwrap(), format!("v{i}"));
    }

    let stats = cache.concurrent_stats();
    assert_eq!(stats.total_async, 200);
    assert_eq!(stats.completed_async, 200);
    assert_eq!(stats.failed_async, 0);
    assert_eq!(stats.completion_rate(), 100.0);
}

#[test]
fn batch_operations_cover_all_shards() {
    let cache = CacheBuilder::new(400)
        .policy(CachePolicy::Lfu)
        .shards(8)
        .workers(2)
        .build_concurrent::<String, String>();

    let items: Vec<(String, String)> = (0..200)
        .map(|i| (format!("k{i}"), format!("v{i}")))
        .collect();
    cache.put_batch_async(items).wait().unwrap();
    assert_eq!(cache.len(), 200);

    let keys: Vec<String> = (0..200).map(|i| format!("k{i}")).collect();
    let values = cache.get_batch_async(keys).wait().unwrap();
    assert!(values.iter().all(|v| v.is_some()));

    let missing = cache
        .get_batch_async(vec!["nope-1".into(), "nope-2".into()])
        .wait()
        .unwrap();
    assert_eq!(missing, vec![None, None]);
}

#[test]
fn warmup_async_preloads_without_misses() {
    let cache = CacheBuilder::new(100)
        .shards(4)
        .workers(2)
        .build_concurrent::<String, String>();

    let data: Vec<(String, String)> = (0..40)
        .map(|i| (format!("warm{i}"), "v".to_string()))
        .collect();
    cache.warmup_async(data).wait().unwrap();

    let stats = cache.statistics();
    assert_eq!(stats.prefetched_items, 40);
    assert_eq!(stats.misses, 0);
    assert_eq!(cache.len(), 40);
}

#[test]
fn async_statistics_and_hot_keys() {
    let cache = CacheBuilder::new(100)
        .shards(4)
        .workers(2)
        .build_concurrent::<String, String>();

    for i in 0..10 {
        cache.put(format!("k{i}"), "v".to_string());
    }
    for _ in 0..5 {
        let _ = cache.get(&"k3".to_string());
    }

    let hot = cache.hot_keys_async(1).wait().unwrap();
    assert_eq!(hot, vec!["k3".to_string()]);

    let stats = cache.statistics_async().wait().unwrap();
    assert_eq!(stats.hits, 5);

    cache.reset_statistics_async().wait().unwrap();
    assert_eq!(cache.statistics().hits, 0);
}

// ==============================================
// Background workers
// ==============================================

#[test]
fn background_workers_start_stop_and_survive_activity() {
    let mut cache = CacheBuilder::new(100)
        .shards(2)
        .workers(2)
        .build_concurrent::<String, String>();

    cache.start_background_optimization();
    cache.schedule_periodic_cleanup(Duration::from_millis(10));
    assert!(cache.background_optimization_running());
    assert!(cache.periodic_cleanup_running());

    // generate a low-hit-rate workload while the workers poll
    for i in 0..200 {
        let _ = cache.get(&format!("missing-{i}"));
    }
    std::thread::sleep(Duration::from_millis(40));

    cache.stop_background_optimization();
    cache.stop_periodic_cleanup();
    assert!(!cache.background_optimization_running());
    assert!(!cache.periodic_cleanup_running());

    // the cache is still fully functional afterwards
    cache.put("k".to_string(), "v".to_string());
    assert_eq!(cache.get(&"k".to_string()).unwrap(), "v");
}
