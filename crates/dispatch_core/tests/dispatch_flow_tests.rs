use std::collections::HashSet;

use dispatch_core::matching::MatchedPair;
use dispatch_core::spatial::GeoPoint;
use dispatch_core::test_helpers::{idle_worker_at, lattice_snapshot, planar_agent, request_at};
use dispatch_core::types::{RequestId, RoundSnapshot, WeightMethod, Worker, WorkerId, WorkerStatus};
use dispatch_core::DispatchError;

fn assert_valid_matching(snapshot: &RoundSnapshot, matches: &[MatchedPair]) {
    let requests: HashSet<_> = matches.iter().map(|m| m.request).collect();
    let workers: HashSet<_> = matches.iter().map(|m| m.worker).collect();
    assert_eq!(requests.len(), matches.len(), "request matched twice");
    assert_eq!(workers.len(), matches.len(), "worker matched twice");
    for m in matches {
        assert!(m.distance <= snapshot.max_pickup_distance);
    }
}

fn total_weight(matches: &[MatchedPair]) -> f64 {
    matches.iter().map(|m| m.weight).sum()
}

#[test_log::test]
fn disjoint_demand_matches_each_request_locally() {
    let mut agent = planar_agent("sarsa", 1);
    let snapshot = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0), request_at(2, 10.0, 10.0, 1.0)],
        vec![idle_worker_at(1, 0.0, 0.0), idle_worker_at(2, 10.0, 10.0)],
        1.0,
    )
    .with_method(WeightMethod::RequestWeight);

    let matches = agent.dispatch(&snapshot).unwrap();
    assert_eq!(
        matches,
        vec![
            MatchedPair {
                request: RequestId(1),
                worker: WorkerId(1),
                weight: 1.0,
                distance: 0.0,
            },
            MatchedPair {
                request: RequestId(2),
                worker: WorkerId(2),
                weight: 1.0,
                distance: 0.0,
            },
        ]
    );
}

#[test_log::test]
fn far_pairs_are_filtered_out() {
    let mut agent = planar_agent("sarsa", 1);
    let snapshot = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0)],
        vec![idle_worker_at(1, 5.0, 5.0)],
        1.0,
    );
    assert!(agent.dispatch(&snapshot).unwrap().is_empty());
}

#[test]
fn degenerate_rounds_return_empty_without_validation() {
    let mut agent = planar_agent("sarsa", 1);

    // Zero requests; the negative distance would otherwise be rejected.
    let no_requests = RoundSnapshot::new(vec![], vec![idle_worker_at(1, 0.0, 0.0)], -3.0);
    assert!(agent.dispatch(&no_requests).unwrap().is_empty());

    let no_workers = RoundSnapshot::new(vec![request_at(1, 0.0, 0.0, 1.0)], vec![], 1.0)
        .with_exploration_rate(7.0);
    assert!(agent.dispatch(&no_workers).unwrap().is_empty());

    let busy_workers = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0)],
        vec![
            Worker::new(1, GeoPoint::new(0.0, 0.0), WorkerStatus::OnTrip),
            Worker::new(2, GeoPoint::new(0.0, 0.0), WorkerStatus::PickingUp),
        ],
        1.0,
    );
    assert!(agent.dispatch(&busy_workers).unwrap().is_empty());
}

#[test]
fn malformed_snapshot_is_data_error() {
    let mut agent = planar_agent("sarsa", 1);
    let snapshot = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0), request_at(1, 1.0, 0.0, 1.0)],
        vec![idle_worker_at(1, 0.0, 0.0)],
        1.0,
    );
    assert!(matches!(agent.dispatch(&snapshot), Err(DispatchError::Data(_))));
}

#[test]
fn pickup_distance_method_prefers_nearest_worker() {
    let mut agent = planar_agent("sarsa", 1);
    let snapshot = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0)],
        vec![
            idle_worker_at(1, 2.0, 0.0),
            idle_worker_at(2, 0.5, 0.0),
            idle_worker_at(3, 1.0, 0.0),
        ],
        3.0,
    )
    .with_method(WeightMethod::PickupDistance);

    let matches = agent.dispatch(&snapshot).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].worker, WorkerId(2));
    assert_eq!(matches[0].weight, 3.5);
}

#[test]
fn repositioning_workers_are_dispatched() {
    let mut agent = planar_agent("sarsa", 1);
    let snapshot = RoundSnapshot::new(
        vec![request_at(1, 0.0, 0.0, 1.0)],
        vec![Worker::new(4, GeoPoint::new(0.1, 0.0), WorkerStatus::Repositioning)],
        1.0,
    );
    let matches = agent.dispatch(&snapshot).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].worker, WorkerId(4));
}

#[test]
fn large_rounds_keep_matching_invariants() {
    for method in [WeightMethod::RequestWeight, WeightMethod::PickupDistance] {
        let mut agent = planar_agent("sarsa", 1);
        let snapshot = lattice_snapshot(120, 80, 20.0, 2.5).with_method(method);
        let matches = agent.dispatch(&snapshot).unwrap();
        assert!(!matches.is_empty());
        assert_valid_matching(&snapshot, &matches);
    }
}

#[test]
fn zero_exploration_is_deterministic() {
    for method in [
        WeightMethod::RequestWeight,
        WeightMethod::PickupDistance,
        WeightMethod::LearnedValue,
    ] {
        let snapshot = lattice_snapshot(60, 60, 10.0, 2.0).with_method(method);
        let first = planar_agent("sarsa", 1).dispatch(&snapshot).unwrap();
        let second = planar_agent("sarsa", 99).dispatch(&snapshot).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn exploration_keeps_matching_invariants() {
    let mut agent = planar_agent("sarsa_no_subway", 5);
    let snapshot = lattice_snapshot(50, 40, 10.0, 2.0)
        .with_method(WeightMethod::LearnedValue)
        .with_exploration_rate(0.5);
    for _ in 0..5 {
        let matches = agent.dispatch(&snapshot).unwrap();
        assert_valid_matching(&snapshot, &matches);
    }
}

#[test]
fn hungarian_solver_matches_at_least_as_much_weight() {
    let snapshot = lattice_snapshot(40, 30, 10.0, 2.0).with_method(WeightMethod::PickupDistance);
    let mut greedy = planar_agent("sarsa", 1);
    let mut exact = dispatch_core::DispatchAgent::new(
        "sarsa",
        serde_json::json!({
            "metric": "euclidean",
            "zone": { "kind": "grid", "cell_size": 1.0 },
            "solver": "hungarian",
            "seed": 1,
        }),
        None,
        false,
    )
    .unwrap();

    let g = greedy.dispatch(&snapshot).unwrap();
    let h = exact.dispatch(&snapshot).unwrap();
    assert_valid_matching(&snapshot, &h);
    // Cells are rounded to 1e-3, so allow that much slack per match.
    assert!(total_weight(&h) + 1e-3 * h.len() as f64 >= total_weight(&g));
}
