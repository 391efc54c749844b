pub mod candidates;
pub mod hungarian;
pub mod solver;
pub mod types;
pub mod weighting;

pub use candidates::generate_candidates;
pub use hungarian::HungarianAssignment;
pub use solver::{AssignmentSolver, GreedyAssignment};
pub use types::{CandidateEdge, MatchedPair};
pub use weighting::assign_weights;
