// Benchmark suite for DistributedList
//
// Compares against Vec for the workloads segmented storage targets:
// - Random inserts and removes in the middle of a large sequence
// - Sequential appends and indexed reads
// - Searches with the fixed default candidate vs the calibrated one

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use distlist::{DistributedList, FixedBalancer, GrowingBalancer, profiling};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn list_of(size: usize) -> DistributedList<u64> {
    let mut list = DistributedList::with_balancer(Arc::new(FixedBalancer::default()), false);
    list.extend_from(0..size as u64);
    return list;
}

// =============================================================================
// Random Mutation Benchmarks
// =============================================================================

fn bench_random_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_inserts");
    group.throughput(Throughput::Elements(1_000));

    for size in SIZES {
        group.bench_with_input(BenchmarkId::new("distributed_list", size), &size, |b, &size| {
            b.iter_batched(
                || (list_of(size), StdRng::seed_from_u64(7)),
                |(mut list, mut rng)| {
                    for i in 0..1_000u64 {
                        let at = rng.gen_range(0..=list.len());
                        let _ = list.insert(at, i);
                    }
                    black_box(list.len())
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("vec", size), &size, |b, &size| {
            b.iter_batched(
                || ((0..size as u64).collect::<Vec<_>>(), StdRng::seed_from_u64(7)),
                |(mut vec, mut rng)| {
                    for i in 0..1_000u64 {
                        let at = rng.gen_range(0..=vec.len());
                        vec.insert(at, i);
                    }
                    black_box(vec.len())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_random_removes(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_removes");
    group.throughput(Throughput::Elements(500));

    for size in SIZES {
        group.bench_with_input(BenchmarkId::new("distributed_list", size), &size, |b, &size| {
            b.iter_batched(
                || (list_of(size), StdRng::seed_from_u64(11)),
                |(mut list, mut rng)| {
                    for _ in 0..500 {
                        let at = rng.gen_range(0..list.len());
                        let _ = list.remove(at);
                    }
                    black_box(list.len())
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("vec", size), &size, |b, &size| {
            b.iter_batched(
                || ((0..size as u64).collect::<Vec<_>>(), StdRng::seed_from_u64(11)),
                |(mut vec, mut rng)| {
                    for _ in 0..500 {
                        let at = rng.gen_range(0..vec.len());
                        vec.remove(at);
                    }
                    black_box(vec.len())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Append and Read Benchmarks
// =============================================================================

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("push");
    let size = 100_000;
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("fixed", |b| {
        b.iter(|| {
            let mut list = DistributedList::with_balancer(Arc::new(FixedBalancer::default()), false);
            for i in 0..size as u64 {
                list.push(i);
            }
            black_box(list.len())
        });
    });

    group.bench_function("growing", |b| {
        b.iter(|| {
            let mut list = DistributedList::with_balancer(Arc::new(GrowingBalancer::default()), false);
            for i in 0..size as u64 {
                list.push(i);
            }
            black_box(list.len())
        });
    });

    group.bench_function("vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..size as u64 {
                vec.push(i);
            }
            black_box(vec.len())
        });
    });

    group.finish();
}

fn bench_random_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_reads");
    let list = list_of(100_000);
    let mut rng = StdRng::seed_from_u64(3);
    let indices: Vec<usize> = (0..10_000).map(|_| rng.gen_range(0..list.len())).collect();
    group.throughput(Throughput::Elements(indices.len() as u64));

    group.bench_function("get", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &i in &indices {
                sum += list.get(i).copied().unwrap_or(0);
            }
            black_box(sum)
        });
    });

    group.bench_function("iter", |b| {
        b.iter(|| black_box(list.iter().sum::<u64>()));
    });

    group.finish();
}

// =============================================================================
// Search Benchmarks
// =============================================================================

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_of");

    for size in SIZES {
        let mut fixed = list_of(size);
        let mut adaptive = fixed.clone();
        fixed.set_adaptive_selection(false);
        adaptive.set_adaptive_selection(true);
        let target = size as u64 - 1;

        group.bench_with_input(BenchmarkId::new("fixed_default", size), &target, |b, target| {
            b.iter(|| black_box(fixed.index_of(target)));
        });
        group.bench_with_input(BenchmarkId::new("adaptive", size), &target, |b, target| {
            b.iter(|| black_box(adaptive.index_of(target)));
        });
    }

    group.finish();
    println!("{}", profiling::report());
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_random_inserts,
    bench_random_removes,
    bench_push,
    bench_random_reads,
    bench_search,
);

criterion_main!(benches);
