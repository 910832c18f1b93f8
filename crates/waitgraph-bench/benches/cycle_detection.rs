//! Graph construction and cycle detection benchmarks.
#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use waitgraph_bench::{SizeTier, generate_snapshot, snapshot_json};
use waitgraph_core::{ProcessSnapshot, build_graph, detect, detect_in, parse_snapshot};

const TIERS: [(&str, SizeTier); 4] = [
    ("S", SizeTier::Small),
    ("M", SizeTier::Medium),
    ("L", SizeTier::Large),
    ("XL", SizeTier::XLarge),
];

fn snapshot(tier: SizeTier, cyclic: bool) -> Vec<ProcessSnapshot> {
    let config = if cyclic {
        tier.config(42)
    } else {
        tier.safe_config(42)
    };
    generate_snapshot(&config).expect("generates")
}

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");
    for (name, tier) in TIERS {
        let procs = snapshot(tier, true);
        group.throughput(Throughput::Elements(procs.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| build_graph(&procs));
        });
    }
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_cycles");
    for (name, tier) in TIERS {
        for (kind, cyclic) in [("cyclic", true), ("acyclic", false)] {
            let procs = snapshot(tier, cyclic);
            let graph = build_graph(&procs);
            group.bench_function(BenchmarkId::new(kind, name), |b| {
                b.iter(|| detect_in(&graph));
            });
        }
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_detect");
    for (name, tier) in TIERS {
        let json = snapshot_json(&snapshot(tier, true)).expect("serializes");
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                let procs = parse_snapshot(&json).expect("parses");
                detect(&procs)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_graph, bench_detect, bench_end_to_end);
criterion_main!(benches);
