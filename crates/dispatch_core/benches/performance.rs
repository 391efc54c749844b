//! Performance benchmarks for dispatch_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::matching::{
    assign_weights, generate_candidates, AssignmentSolver, GreedyAssignment, HungarianAssignment,
};
use dispatch_core::spatial::DistanceMetric;
use dispatch_core::test_helpers::{lattice_snapshot, planar_agent};
use dispatch_core::types::WeightMethod;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_dispatch_round(c: &mut Criterion) {
    let scenarios = vec![
        ("small", 50, 100),
        ("medium", 200, 500),
        ("large", 500, 1000),
    ];

    let mut group = c.benchmark_group("dispatch_round");
    for (name, requests, workers) in scenarios {
        let snapshot = lattice_snapshot(requests, workers, 50.0, 3.0)
            .with_method(WeightMethod::PickupDistance);
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snapshot| {
            let mut agent = planar_agent("sarsa", 42);
            b.iter(|| black_box(agent.dispatch(snapshot).expect("valid snapshot")));
        });
    }
    group.finish();
}

fn bench_assignment_solvers(c: &mut Criterion) {
    let snapshot =
        lattice_snapshot(100, 200, 20.0, 3.0).with_method(WeightMethod::PickupDistance);
    let mut edges = generate_candidates(&snapshot, DistanceMetric::Euclidean);
    assign_weights(&mut edges, &snapshot, None, &mut StdRng::seed_from_u64(0))
        .expect("static weighting");

    let mut group = c.benchmark_group("assignment_solvers");
    group.bench_function("greedy_100x200", |b| {
        b.iter(|| black_box(GreedyAssignment.solve(&edges)));
    });
    group.bench_function("hungarian_100x200", |b| {
        b.iter(|| black_box(HungarianAssignment.solve(&edges)));
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch_round, bench_assignment_solvers);
criterion_main!(benches);
