//! Hungarian (Kuhn-Munkres) algorithm for maximum-weight bipartite matching.
//!
//! Optimizes globally over all admitted edges of a round instead of accepting
//! edges one by one. Pairs without an admitted edge are never selected.

use std::collections::BTreeSet;

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use crate::types::{RequestId, WorkerId};

use super::solver::{compare_edges, AssignmentSolver};
use super::types::{CandidateEdge, MatchedPair};

/// Scale factor to convert f64 weights to i64 for the assignment algorithm.
/// Rounds whose heaviest edge would exceed the cell cap use a smaller one.
const SCALE: f64 = 1_000.0;

/// Cell value for pairs without an admitted edge. Admitted edges always map
/// to cells of at least 1, so a zero cell never contributes to the optimum.
const INFEASIBLE: i64 = 0;

/// Simple matrix type implementing pathfinding's Weights for i64.
struct I64Weights(Vec<Vec<i64>>);

impl Weights<i64> for I64Weights {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn columns(&self) -> usize {
        self.0.first().map_or(0, |r| r.len())
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.0[row][col]
    }

    fn neg(&self) -> Self {
        I64Weights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

/// Hungarian matching: global optimization via maximum-weight bipartite assignment.
///
/// Rounds whose lightest edge weighs less than 1 (learned values, zero base
/// weights) are shifted so that edge weighs 1; the shift adds a constant per
/// match and so favors matching more pairs. Results are
/// reported in the same order [`super::GreedyAssignment`] would accept them, so
/// both solvers return identical output when no two edges share a request or
/// a worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct HungarianAssignment;

impl HungarianAssignment {
    /// Largest scale that maps the heaviest shifted weight to at most `cap`.
    fn round_scale(max_weight: f64, offset: f64, cap: i64) -> f64 {
        // Halved so the shifted maximum stays finite for any finite inputs.
        let half_span = max_weight * 0.5 + offset * 0.5;
        SCALE.min(cap as f64 / half_span * 0.5)
    }

    /// Convert a shifted weight to an i64 cell, clamped so that a full row sum
    /// cannot overflow.
    fn weight_to_cell(weight: f64, offset: f64, scale: f64, cap: i64) -> i64 {
        let w = (weight * scale + offset * scale).round();
        if w >= cap as f64 {
            cap
        } else {
            (w as i64).max(1)
        }
    }
}

impl AssignmentSolver for HungarianAssignment {
    fn solve(&self, edges: &[CandidateEdge]) -> Vec<MatchedPair> {
        if edges.is_empty() {
            return Vec::new();
        }

        let requests: Vec<RequestId> = edges
            .iter()
            .map(|e| e.request)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let workers: Vec<WorkerId> = edges
            .iter()
            .map(|e| e.worker)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Kuhn-Munkres requires rows <= columns. So we use the smaller set as rows.
        let requests_are_rows = requests.len() <= workers.len();
        let (rows, cols) = if requests_are_rows {
            (requests.len(), workers.len())
        } else {
            (workers.len(), requests.len())
        };

        let (min_weight, max_weight) = edges
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.weight), hi.max(e.weight))
            });
        let offset = (1.0 - min_weight).max(0.0);
        let cap = i64::MAX / (rows as i64 + 1);
        let scale = Self::round_scale(max_weight, offset, cap);

        let mut matrix = vec![vec![INFEASIBLE; cols]; rows];
        let mut cell_edges: Vec<Vec<Option<&CandidateEdge>>> = vec![vec![None; cols]; rows];
        for edge in edges {
            // Both id lists are sorted, so positions are found by binary search.
            let (Ok(r), Ok(w)) = (
                requests.binary_search(&edge.request),
                workers.binary_search(&edge.worker),
            ) else {
                continue;
            };
            let (i, j) = if requests_are_rows { (r, w) } else { (w, r) };
            matrix[i][j] = Self::weight_to_cell(edge.weight, offset, scale, cap);
            cell_edges[i][j] = Some(edge);
        }

        let weights = I64Weights(matrix);
        let (_total, assignments) = kuhn_munkres(&weights);

        let mut selected: Vec<&CandidateEdge> = assignments
            .iter()
            .enumerate()
            .filter(|&(row, &col)| weights.at(row, col) > INFEASIBLE)
            .filter_map(|(row, &col)| cell_edges[row][col])
            .collect();
        selected.sort_by(|a, b| compare_edges(a, b));
        selected.into_iter().map(|e| MatchedPair::from(*e)).collect()
    }

    fn name(&self) -> &str {
        "hungarian"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::GreedyAssignment;

    fn edge(request: u64, worker: u64, weight: f64, distance: f64) -> CandidateEdge {
        CandidateEdge {
            request: RequestId(request),
            worker: WorkerId(worker),
            weight,
            distance,
        }
    }

    fn total_weight(result: &[MatchedPair]) -> f64 {
        result.iter().map(|p| p.weight).sum()
    }

    #[test]
    fn beats_greedy_on_competing_edges() {
        // Greedy takes (1,1) at 10 and strands request 2; the optimum is 9 + 8.
        let edges = [edge(1, 1, 10.0, 0.0), edge(1, 2, 9.0, 0.0), edge(2, 1, 8.0, 0.0)];
        let greedy = GreedyAssignment.solve(&edges);
        let exact = HungarianAssignment.solve(&edges);
        assert_eq!(greedy.len(), 1);
        assert_eq!(exact.len(), 2);
        assert!(total_weight(&exact) > total_weight(&greedy));
    }

    #[test]
    fn agrees_with_greedy_without_competition() {
        let edges = [
            edge(3, 30, 1.0, 0.2),
            edge(1, 10, 4.0, 0.0),
            edge(2, 20, 4.0, 0.1),
        ];
        assert_eq!(HungarianAssignment.solve(&edges), GreedyAssignment.solve(&edges));
    }

    #[test]
    fn handles_more_requests_than_workers() {
        let edges = [
            edge(1, 1, 1.0, 0.0),
            edge(2, 1, 3.0, 0.0),
            edge(3, 1, 2.0, 0.0),
            edge(3, 2, 0.5, 0.0),
        ];
        let result = HungarianAssignment.solve(&edges);
        let pairs: Vec<(u64, u64)> = result.iter().map(|p| (p.request.0, p.worker.0)).collect();
        assert_eq!(pairs, vec![(2, 1), (3, 2)]);
    }

    #[test]
    fn negative_weights_are_still_matched() {
        let edges = [edge(1, 1, -4.0, 0.0), edge(2, 2, -1.0, 0.0)];
        let result = HungarianAssignment.solve(&edges);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].request, RequestId(2));
    }

    #[test]
    fn huge_weights_keep_their_order() {
        let edges = [edge(1, 1, 1e17, 0.0), edge(1, 2, 3e17, 0.0)];
        let result = HungarianAssignment.solve(&edges);
        assert_eq!(result, GreedyAssignment.solve(&edges));
        assert_eq!(result[0].worker, WorkerId(2));
    }

    #[test]
    fn huge_competing_weights_still_optimal() {
        let edges = [
            edge(1, 1, 2.0e17, 0.0),
            edge(1, 2, 1.5e17, 0.0),
            edge(2, 1, 1.5e17, 0.0),
            edge(2, 2, 0.1e17, 0.0),
            edge(3, 3, 1.0e17, 0.0),
        ];
        let exact = HungarianAssignment.solve(&edges);
        let greedy = GreedyAssignment.solve(&edges);
        assert_eq!(exact.len(), 3);
        assert!(total_weight(&exact) >= total_weight(&greedy));
        assert_eq!(total_weight(&exact), 4.0e17);
    }

    #[test]
    fn spread_beyond_f64_range_is_still_matched() {
        let edges = [edge(1, 1, -1.7e308, 0.0), edge(2, 2, 1.7e308, 0.0)];
        let result = HungarianAssignment.solve(&edges);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].request, RequestId(2));
    }
}
