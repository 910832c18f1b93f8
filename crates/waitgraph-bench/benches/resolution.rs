//! Advice, resolution and validation benchmarks.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use waitgraph_bench::{SizeTier, generate_snapshot};
use waitgraph_core::{detect, recommend, resolve_first_cycle, resolve_until_safe, validate_snapshot};

const TIERS: [(&str, SizeTier); 3] = [
    ("S", SizeTier::Small),
    ("M", SizeTier::Medium),
    ("L", SizeTier::Large),
];

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");
    for (name, tier) in TIERS {
        let procs = generate_snapshot(&tier.config(42)).expect("generates");
        let result = detect(&procs);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| recommend(&procs, result.cycles()));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.sample_size(20);
    for (name, tier) in TIERS {
        let procs = generate_snapshot(&tier.config(42)).expect("generates");
        let result = detect(&procs);
        group.bench_function(BenchmarkId::new("first_cycle", name), |b| {
            b.iter(|| resolve_first_cycle(&procs, &result));
        });
        group.bench_function(BenchmarkId::new("until_safe", name), |b| {
            b.iter(|| resolve_until_safe(&procs, usize::MAX));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for (name, tier) in TIERS {
        let procs = generate_snapshot(&tier.config(42)).expect("generates");
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| validate_snapshot(&procs));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_recommend, bench_resolve, bench_validate);
criterion_main!(benches);
