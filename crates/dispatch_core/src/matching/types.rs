use serde::{Deserialize, Serialize};

use crate::types::{RequestId, WorkerId};

/// A request-worker pairing that survived the pickup-distance filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateEdge {
    pub request: RequestId,
    pub worker: WorkerId,
    /// Placeholder (0.0) until the weighting step runs.
    pub weight: f64,
    pub distance: f64,
}

impl CandidateEdge {
    pub fn new(request: RequestId, worker: WorkerId, distance: f64) -> Self {
        Self {
            request,
            worker,
            weight: 0.0,
            distance,
        }
    }
}

/// A candidate edge selected by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub request: RequestId,
    pub worker: WorkerId,
    pub weight: f64,
    pub distance: f64,
}

impl From<CandidateEdge> for MatchedPair {
    fn from(edge: CandidateEdge) -> Self {
        Self {
            request: edge.request,
            worker: edge.worker,
            weight: edge.weight,
            distance: edge.distance,
        }
    }
}
