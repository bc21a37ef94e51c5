//! Micro-operation benchmarks across the four eviction policies.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency for get hits, inserts under eviction
//! pressure, and a mixed hot/cold workload, under identical conditions for
//! every policy.

use std::hint::black_box;
use std::time::Instant;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use vfscache::manager::CacheManager;
use vfscache::policy::CachePolicy;

const CAPACITY: usize = 16_384;
const OPS: u64 = 100_000;

const POLICIES: [(&str, CachePolicy); 4] = [
    ("lru", CachePolicy::Lru),
    ("lfu", CachePolicy::Lfu),
    ("fifo", CachePolicy::Fifo),
    ("lifo", CachePolicy::Lifo),
];

fn warmed_cache(policy: CachePolicy) -> CacheManager<u64, u64> {
    let mut cache = CacheManager::new(CAPACITY, policy);
    for i in 0..CAPACITY as u64 {
        cache.put(i, i);
    }
    cache
}

// ============================================================================
// Get Hit Latency (ns/op)
// ============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in POLICIES {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut cache = warmed_cache(policy);
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % (CAPACITY as u64);
                        black_box(cache.get(&key).ok());
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Insert With Eviction (ns/op)
// ============================================================================

fn bench_insert_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_evict_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in POLICIES {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut cache = warmed_cache(policy);
                let start = Instant::now();
                for iter in 0..iters {
                    let base = (iter + 1) * OPS;
                    for i in 0..OPS {
                        cache.put(base + i, i);
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Mixed Hot/Cold Workload (ns/op)
// ============================================================================

fn bench_mixed_hotset(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_hotset_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in POLICIES {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut cache = warmed_cache(policy);
                let mut rng = SmallRng::seed_from_u64(42);
                let hot = (CAPACITY / 10) as u64;
                let universe = (CAPACITY * 4) as u64;

                let start = Instant::now();
                for _ in 0..iters {
                    for _ in 0..OPS {
                        // 90% of traffic hits the hot 10%
                        let key = if rng.random_bool(0.9) {
                            rng.random_range(0..hot)
                        } else {
                            rng.random_range(0..universe)
                        };
                        if cache.get(&key).is_err() {
                            cache.put(key, key);
                        }
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_insert_evicting, bench_mixed_hotset);
criterion_main!(benches);
