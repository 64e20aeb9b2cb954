use criterion::{criterion_main, BenchmarkId, Criterion};
use crossbeam_utils::sync::WaitGroup;
use env_logger::Env;
use rand::Rng;
use std::io;
use stester::thread_pool::WorkerPool;
use stester::{Config, StdRng, Tester};

fn spawn_jobs(c: &mut Criterion) {
    env_logger::init_from_env(Env::default().default_filter_or("error"));
    let mut group = c.benchmark_group("pool");
    group.sample_size(20);
    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("spawn", threads),
            &threads,
            |b, &threads| {
                let pool = WorkerPool::new(threads, 100).unwrap();
                b.iter(|| {
                    let wg = WaitGroup::new();
                    for i in 0..1000u64 {
                        let wg = wg.clone();
                        pool.spawn(move || {
                            criterion::black_box(i.wrapping_mul(i));
                            drop(wg);
                        });
                    }
                    wg.wait();
                });
                pool.stop();
            },
        );
    }
    group.finish();
}

fn find_counterexample(c: &mut Criterion) {
    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    for threads in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::new("rare_mismatch", threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let tester = Tester::with_config(Config {
                        color: false,
                        ..Config::with_threads(threads)
                    })
                    .unwrap();
                    tester.run_stress_test(
                        |x: &u32| *x,
                        |x: &u32| if *x == 4242 { 0 } else { *x },
                        |rng: &mut StdRng| rng.gen_range(0..10_000u32),
                        |a: u32, b: u32| a == b,
                        io::sink(),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion::criterion_group!(benches, spawn_jobs, find_counterexample);
criterion_main!(benches);
