use std::cmp::Ordering;
use std::collections::HashSet;

use super::types::{CandidateEdge, MatchedPair};

/// Trait for assignment algorithms that turn weighted candidate edges into a
/// one-to-one matching.
///
/// Implementations must never use a request or a worker twice, must only
/// return edges from `edges`, and must not depend on anything but the edges
/// they are given.
///
/// # Examples
///
/// ```rust
/// use dispatch_core::matching::{AssignmentSolver, CandidateEdge, GreedyAssignment};
/// use dispatch_core::types::{RequestId, WorkerId};
///
/// let mut edge = CandidateEdge::new(RequestId(1), WorkerId(1), 0.4);
/// edge.weight = 2.0;
/// let pairs = GreedyAssignment.solve(&[edge]);
/// assert_eq!(pairs.len(), 1);
/// ```
pub trait AssignmentSolver: Send + Sync {
    /// Returns the matched pairs in acceptance order.
    fn solve(&self, edges: &[CandidateEdge]) -> Vec<MatchedPair>;

    fn name(&self) -> &str;
}

/// Deterministic processing order: weight descending, then distance, request
/// id and worker id ascending.
pub fn compare_edges(a: &CandidateEdge, b: &CandidateEdge) -> Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then_with(|| a.distance.total_cmp(&b.distance))
        .then_with(|| a.request.cmp(&b.request))
        .then_with(|| a.worker.cmp(&b.worker))
}

/// Greedy-by-weight matching.
///
/// Walks the edges in [`compare_edges`] order and accepts an edge when
/// neither its request nor its worker has been matched yet.
///
/// # Performance
///
/// O(E log E) for E candidate edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAssignment;

impl AssignmentSolver for GreedyAssignment {
    fn solve(&self, edges: &[CandidateEdge]) -> Vec<MatchedPair> {
        let mut ordered: Vec<&CandidateEdge> = edges.iter().collect();
        ordered.sort_by(|a, b| compare_edges(a, b));

        let mut used_requests = HashSet::new();
        let mut used_workers = HashSet::new();
        let mut results = Vec::new();
        for edge in ordered {
            if used_requests.contains(&edge.request) || used_workers.contains(&edge.worker) {
                continue;
            }
            used_requests.insert(edge.request);
            used_workers.insert(edge.worker);
            results.push(MatchedPair::from(*edge));
        }
        results
    }

    fn name(&self) -> &str {
        "greedy"
    }
}
