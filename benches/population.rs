//! Population run throughput
//!
//! Compares sequential and rayon-backed runs over cohorts of increasing size.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use crcsim::core::config::SimulationConfig;
use crcsim::population::{cohort, PopulationRunner};

fn bench_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("population");
    let runner = PopulationRunner::new(SimulationConfig::default(), 2024).unwrap();

    for size in [1_000u64, 10_000] {
        let people = cohort(size);
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("sequential", size), &people, |b, people| {
            b.iter(|| runner.run(black_box(people)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &people, |b, people| {
            b.iter(|| runner.run_parallel(black_box(people)).unwrap())
        });
    }

    group.finish();
}

/// A single lifetime, dominated by scheduler and statechart overhead
fn bench_single_person(c: &mut Criterion) {
    let config = SimulationConfig::default();
    c.bench_function("single_person", |b| {
        let mut index = 0u64;
        b.iter(|| {
            index += 1;
            let rng = crcsim::core::rng::RandomStream::for_person(7, index);
            crcsim::person::Person::simulate(
                crcsim::core::types::PersonSpec::new(index),
                black_box(&config),
                rng,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_population, bench_single_person);
criterion_main!(benches);
