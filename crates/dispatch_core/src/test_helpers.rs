//! Test helpers for common test setup and utilities.
//!
//! This module provides shared snapshot builders to reduce duplication across
//! test files and benches.

use serde_json::json;

use crate::agent::DispatchAgent;
use crate::spatial::GeoPoint;
use crate::types::{Request, RoundSnapshot, Worker, WorkerStatus};

/// A standard test location: Berlin Alexanderplatz as (lng, lat).
pub const TEST_LNG: f64 = 13.4132;
pub const TEST_LAT: f64 = 52.5219;

pub fn test_point() -> GeoPoint {
    GeoPoint::new(TEST_LNG, TEST_LAT)
}

pub fn request_at(id: u64, x: f64, y: f64, weight: f64) -> Request {
    Request::new(id, GeoPoint::new(x, y), weight)
}

pub fn idle_worker_at(id: u64, x: f64, y: f64) -> Worker {
    Worker::new(id, GeoPoint::new(x, y), WorkerStatus::Idle)
}

/// Agent on the planar metric with a 1-unit grid, seeded for determinism.
///
/// # Panics
///
/// Panics if the fixed configuration is rejected (should never happen).
pub fn planar_agent(strategy: &str, seed: u64) -> DispatchAgent {
    DispatchAgent::new(
        strategy,
        json!({
            "metric": "euclidean",
            "zone": { "kind": "grid", "cell_size": 1.0 },
            "seed": seed,
        }),
        None,
        false,
    )
    .expect("planar test agent configuration should be valid")
}

/// `requests` requests and `workers` idle workers scattered on a square of
/// side `extent` with a deterministic lattice pattern.
pub fn lattice_snapshot(requests: usize, workers: usize, extent: f64, max_pickup: f64) -> RoundSnapshot {
    let coord = |i: usize, stride: usize| ((i * stride) % 997) as f64 / 997.0 * extent;
    let reqs = (0..requests)
        .map(|i| request_at(i as u64, coord(i, 31), coord(i, 57), 1.0 + (i % 5) as f64))
        .collect();
    let drivers = (0..workers)
        .map(|i| idle_worker_at(i as u64, coord(i, 43), coord(i, 19)))
        .collect();
    RoundSnapshot::new(reqs, drivers, max_pickup)
}
