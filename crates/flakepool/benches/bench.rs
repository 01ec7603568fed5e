use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flakepool::{
    AtomicFlakeGenerator, IdGenerator, MIN_CAPACITY, PoolConfig, PoolManager, TimeSource, WallClock,
};
use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::scope,
    time::Instant,
};

/// Advances one millisecond per full sequence, so generation never spins.
struct SyntheticTime {
    reads: AtomicU64,
}

impl TimeSource for SyntheticTime {
    fn current_millis(&self) -> u64 {
        1_600_000_000_000 + self.reads.fetch_add(1, Ordering::Relaxed) / 32_768
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// Benchmarks a generator on a single thread.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: IdGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a generator shared across threads.
fn bench_generator_contended<G>(c: &mut Criterion, group_name: &str, generator_fn: impl Fn() -> G)
where
    G: IdGenerator,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let generator = Arc::new(generator_fn());
                    let barrier = Arc::new(Barrier::new(thread_count + 1));
                    scope(|s| {
                        for _ in 0..thread_count {
                            let generator = Arc::clone(&generator);
                            let barrier = Arc::clone(&barrier);
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..ids_per_thread {
                                    black_box(generator.next_id().unwrap());
                                }
                            });
                        }
                        barrier.wait();
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks `acquire()` against a warm pool shared across threads.
fn bench_pool_acquire(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/acquire");
    let pool = PoolManager::with_config(
        PoolConfig::new(MIN_CAPACITY),
        AtomicFlakeGenerator::new(WallClock),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    for thread_count in [1, 2, 4, 8] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    scope(|s| {
                        for _ in 0..thread_count {
                            let pool = &pool;
                            s.spawn(move || {
                                for _ in 0..ids_per_thread {
                                    black_box(pool.acquire().unwrap());
                                }
                            });
                        }
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
    pool.shut_down();
}

fn benchmark_synthetic_sequential(c: &mut Criterion) {
    bench_generator(c, "synthetic/sequential/atomic", || {
        AtomicFlakeGenerator::new(SyntheticTime {
            reads: AtomicU64::new(0),
        })
    });
}

fn benchmark_wall_sequential(c: &mut Criterion) {
    bench_generator(c, "wall/sequential/atomic", || {
        AtomicFlakeGenerator::new(WallClock)
    });
}

fn benchmark_wall_contended(c: &mut Criterion) {
    bench_generator_contended(c, "wall/contended/atomic", || {
        AtomicFlakeGenerator::new(WallClock)
    });
}

criterion_group!(
    benches,
    benchmark_synthetic_sequential,
    benchmark_wall_sequential,
    benchmark_wall_contended,
    bench_pool_acquire,
);
criterion_main!(benches);
