//! Candidate generation: the request × ready-worker cross product, filtered by
//! maximum pickup distance.

use rayon::prelude::*;

use crate::spatial::DistanceMetric;
use crate::types::{Request, RoundSnapshot, Worker};

use super::types::CandidateEdge;

/// Rounds with at least this many pairs compute distances on the rayon pool.
const PARALLEL_PAIR_THRESHOLD: usize = 4_096;

/// Builds all admissible edges in request-major order (requests in snapshot
/// order, then ready workers in snapshot order). Pairs at exactly the maximum
/// pickup distance are admitted.
pub fn generate_candidates(snapshot: &RoundSnapshot, metric: DistanceMetric) -> Vec<CandidateEdge> {
    let ready: Vec<&Worker> = snapshot.ready_workers().collect();
    let max_pickup_distance = snapshot.max_pickup_distance;

    let edges_for = |request: &Request| -> Vec<CandidateEdge> {
        ready
            .iter()
            .filter_map(|worker| {
                let distance = metric.distance(request.origin, worker.location);
                (distance <= max_pickup_distance)
                    .then(|| CandidateEdge::new(request.id, worker.id, distance))
            })
            .collect()
    };

    let pair_count = snapshot.requests.len().saturating_mul(ready.len());
    if pair_count >= PARALLEL_PAIR_THRESHOLD {
        // Ordered collect keeps the sequential request-major layout.
        snapshot
            .requests
            .par_iter()
            .flat_map_iter(|request| edges_for(request))
            .collect()
    } else {
        snapshot.requests.iter().flat_map(edges_for).collect()
    }
}
