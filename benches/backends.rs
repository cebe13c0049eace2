//! Per-operation benchmarks for every cache backend and for memoized calls.
//!
//! Run with: `cargo bench --bench backends`
//!
//! Measures read-hit latency, write latency and memoized-call latency under
//! a skewed random key workload, identical across backends.

use std::convert::Infallible;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use memokit::builder::{Backend, MemoizeOptions};
use memokit::memo::Memoizer;
use memokit::store::{LockedCache, PerKeyCache, ThreadLocalCache, UnsyncCache};
use memokit::traits::Cache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KEYS: u64 = 4_096;
const OPS: u64 = 50_000;
const SEED: u64 = 0x5eed;

/// Keys drawn so that a small hot set receives most of the traffic.
fn skewed_keys(n: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..n)
        .map(|_| {
            if rng.gen_bool(0.8) {
                rng.gen_range(0..KEYS / 16)
            } else {
                rng.gen_range(0..KEYS)
            }
        })
        .collect()
}

fn filled<C: Cache<u64, u64, ()>>(cache: C) -> C {
    for i in 0..KEYS {
        cache.save_value(&i, i);
    }
    cache
}

// ============================================================================
// Read Hit Latency (ns/op)
// ============================================================================

fn read_hit<C: Cache<u64, u64, ()>>(c: &mut Criterion, name: &str, make: impl Fn() -> C) {
    let keys = skewed_keys(OPS);
    let mut group = c.benchmark_group("read_hit_ns");
    group.throughput(Throughput::Elements(OPS));
    group.bench_function(name, |b| {
        b.iter_custom(|iters| {
            let cache = filled(make());
            let start = Instant::now();
            for _ in 0..iters {
                for key in &keys {
                    black_box(cache.get_value(key).ok());
                }
            }
            start.elapsed()
        })
    });
    group.finish();
}

fn bench_read_hit(c: &mut Criterion) {
    read_hit(c, "unsync", UnsyncCache::<u64, u64, ()>::new);
    read_hit(c, "thread_local", ThreadLocalCache::<u64, u64, ()>::new);
    read_hit(c, "locked", LockedCache::<u64, u64, ()>::new);
    read_hit(c, "per_key", PerKeyCache::<u64, u64, ()>::new);
}

// ============================================================================
// Write Latency (ns/op)
// ============================================================================

fn write<C: Cache<u64, u64, ()>>(c: &mut Criterion, name: &str, make: impl Fn() -> C) {
    let keys = skewed_keys(OPS);
    let mut group = c.benchmark_group("write_ns");
    group.throughput(Throughput::Elements(OPS));
    group.bench_function(name, |b| {
        b.iter_custom(|iters| {
            let cache = make();
            let start = Instant::now();
            for _ in 0..iters {
                for key in &keys {
                    cache.save_value(key, *key);
                }
            }
            start.elapsed()
        })
    });
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    write(c, "unsync", UnsyncCache::<u64, u64, ()>::new);
    write(c, "thread_local", ThreadLocalCache::<u64, u64, ()>::new);
    write(c, "locked", LockedCache::<u64, u64, ()>::new);
    write(c, "per_key", PerKeyCache::<u64, u64, ()>::new);
}

// ============================================================================
// Memoized Call Latency (ns/op)
// ============================================================================

fn bench_memoized_call(c: &mut Criterion) {
    let keys = skewed_keys(OPS);
    let mut group = c.benchmark_group("memoized_call_ns");
    group.throughput(Throughput::Elements(OPS));

    for backend in [Backend::ThreadLocal, Backend::Locked, Backend::PerKey] {
        let name = format!("{backend:?}").to_lowercase();
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let memo = Memoizer::with_options(
                    |&(n,): &(u64,)| Ok::<_, Infallible>(n.wrapping_mul(0x9e37_79b9)),
                    &MemoizeOptions::new().backend(backend),
                )
                .unwrap();
                let start = Instant::now();
                for _ in 0..iters {
                    for &key in &keys {
                        black_box(memo.cached(&(key,)).ok());
                    }
                }
                start.elapsed()
            })
        });
    }

    group.bench_function("raw", |b| {
        let memo = Memoizer::with_cache(
            |&(n,): &(u64,)| Ok::<_, Infallible>(n.wrapping_mul(0x9e37_79b9)),
            Arc::new(UnsyncCache::new()),
            true,
        );
        b.iter(|| {
            for &key in &keys {
                black_box(memo.raw(&(key,)).ok());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_read_hit, bench_write, bench_memoized_call);
criterion_main!(benches);
