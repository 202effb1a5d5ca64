//! Throughput benchmarks for the concurrent skip list
//!
//! Single-threaded numbers establish the baseline cost of the algorithm;
//! multi-threaded numbers show how that cost holds up under the lock
//! coupling the design relies on instead of a list-wide lock.

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skiplist::SkipList;

fn bench_insert_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_single_threaded");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let list = SkipList::with_max_level(16).unwrap();
                for key in 0..size {
                    black_box(list.insert(key, Vec::new()));
                }
            });
        });
    }

    group.finish();
}

fn bench_contains_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains_single_threaded");

    for size in [100, 1_000, 10_000].iter() {
        let list = SkipList::with_max_level(16).unwrap();
        for key in 0..*size {
            list.insert(key, Vec::new());
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let key = size / 2;
            b.iter(|| {
                black_box(list.contains(key));
            });
        });
    }

    group.finish();
}

fn bench_erase_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("erase_single_threaded");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let list = SkipList::with_max_level(16).unwrap();
                for key in 0..size {
                    list.insert(key, Vec::new());
                }
                for key in 0..size {
                    black_box(list.erase(key));
                }
            });
        });
    }

    group.finish();
}

fn bench_insert_multi_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_multi_threaded");

    for threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            threads,
            |b, &threads| {
                b.iter(|| {
                    let list = Arc::new(SkipList::with_max_level(16).unwrap());
                    let per_thread = 2_000u64;

                    let handles: Vec<_> = (0..threads)
                        .map(|thread_id| {
                            let list = Arc::clone(&list);
                            thread::spawn(move || {
                                let base = thread_id as u64 * per_thread;
                                for key in base..base + per_thread {
                                    black_box(list.insert(key, Vec::new()));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_mixed_operations_multi_threaded(c: &mut Criterion) {
    c.bench_function("mixed_operations_multi_threaded", |b| {
        b.iter(|| {
            let list = Arc::new(SkipList::with_max_level(16).unwrap());
            for key in 0..4_000u64 {
                list.insert(key, Vec::new());
            }

            let handles: Vec<_> = (0..4)
                .map(|thread_id| {
                    let list = Arc::clone(&list);
                    thread::spawn(move || {
                        for i in 0..1_000u64 {
                            let key = (thread_id as u64 * 1_000 + i) % 4_000;
                            match i % 3 {
                                0 => {
                                    black_box(list.insert(key + 4_000, Vec::new()));
                                }
                                1 => {
                                    black_box(list.erase(key));
                                }
                                _ => {
                                    black_box(list.contains(key));
                                }
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_insert_single_threaded,
    bench_contains_single_threaded,
    bench_erase_single_threaded,
    bench_insert_multi_threaded,
    bench_mixed_operations_multi_threaded
);
criterion_main!(benches);
