//! Dispatch agent: one matching round per call, plus the learning entry point.
//!
//! A round runs candidate generation, edge weighting and assignment to
//! completion on the caller's thread. The agent owns its policy; methods take
//! `&mut self`, so calls into one agent are serialized by construction and
//! separate agents share nothing.

use std::path::Path;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{SolverKind, StrategyParams};
use crate::error::{DispatchError, Result};
use crate::matching::{
    assign_weights, generate_candidates, AssignmentSolver, GreedyAssignment, HungarianAssignment,
    MatchedPair,
};
use crate::policy::{SarsaPolicy, Transition, ValuePolicy};
use crate::types::RoundSnapshot;

pub use crate::config::StrategyKind;

impl StrategyKind {
    /// Builds the policy family behind this strategy.
    fn build_policy(self, params: &StrategyParams) -> Box<dyn ValuePolicy> {
        match self {
            StrategyKind::Sarsa
            | StrategyKind::SarsaNoSubway
            | StrategyKind::SarsaTravelTime
            | StrategyKind::SarsaTravelTimeNoSubway
            | StrategyKind::SarsaTotalTravelTime
            | StrategyKind::SarsaTotalTravelTimeNoSubway => Box::new(SarsaPolicy::new(self, params)),
        }
    }
}

impl SolverKind {
    fn build(self) -> Box<dyn AssignmentSolver> {
        match self {
            SolverKind::Greedy => Box::new(GreedyAssignment),
            SolverKind::Hungarian => Box::new(HungarianAssignment),
        }
    }
}

pub struct DispatchAgent {
    strategy: StrategyKind,
    params: StrategyParams,
    policy: Option<Box<dyn ValuePolicy>>,
    solver: Box<dyn AssignmentSolver>,
    rng: StdRng,
}

impl DispatchAgent {
    /// Creates an agent from a strategy identifier and a configuration map.
    ///
    /// With `flag_load` set, parameters are loaded from `load_path`; a missing
    /// path or a failed load is a configuration error.
    pub fn new(
        strategy_type: &str,
        strategy_params: serde_json::Value,
        load_path: Option<&Path>,
        flag_load: bool,
    ) -> Result<Self> {
        let strategy: StrategyKind = strategy_type.parse()?;
        let params = StrategyParams::from_value(strategy_params)?;
        Self::with_params(strategy, params, load_path, flag_load)
    }

    pub fn with_params(
        strategy: StrategyKind,
        params: StrategyParams,
        load_path: Option<&Path>,
        flag_load: bool,
    ) -> Result<Self> {
        params.validate()?;
        let mut policy = strategy.build_policy(&params);

        if flag_load {
            let path = load_path.ok_or_else(|| {
                DispatchError::configuration(format!(
                    "loading requested for {strategy} but no load path was given"
                ))
            })?;
            info!("Loading parameters for strategy {strategy} from {}", path.display());
            policy.load(path).map_err(|err| match err {
                DispatchError::Configuration(_) => err,
                other => DispatchError::configuration(format!(
                    "failed to load parameters for {strategy}: {other}"
                )),
            })?;
        }

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let solver = params.solver.build();
        info!(
            "Dispatch agent ready: strategy={strategy}, solver={}, metric={:?}",
            solver.name(),
            params.metric
        );

        Ok(Self {
            strategy,
            params,
            policy: Some(policy),
            solver,
            rng,
        })
    }

    /// Replaces the exploration randomness source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn policy(&self) -> Option<&dyn ValuePolicy> {
        self.policy.as_deref()
    }

    /// Runs one dispatch round.
    ///
    /// Zero requests or zero ready workers yield an empty matching without
    /// looking at any other field. Otherwise the snapshot is validated,
    /// candidates are generated, weighted and handed to the solver.
    pub fn dispatch(&mut self, snapshot: &RoundSnapshot) -> Result<Vec<MatchedPair>> {
        let ready = snapshot.ready_worker_count();
        if snapshot.requests.is_empty() || ready == 0 {
            debug!(
                "Skipping round: {} requests, {} ready workers",
                snapshot.requests.len(),
                ready
            );
            return Ok(Vec::new());
        }
        snapshot.validate()?;

        let mut edges = generate_candidates(snapshot, self.params.metric);
        if edges.is_empty() {
            debug!(
                "No candidates within {} for {} requests and {} ready workers",
                snapshot.max_pickup_distance,
                snapshot.requests.len(),
                ready
            );
            return Ok(Vec::new());
        }

        assign_weights(&mut edges, snapshot, self.policy.as_deref(), &mut self.rng)?;
        let matches = self.solver.solve(&edges);
        debug!(
            "Round at t={}s: {} requests, {} ready workers, {} candidates, {} matches ({:?})",
            snapshot.timestamp_secs,
            snapshot.requests.len(),
            ready,
            edges.len(),
            matches.len(),
            snapshot.method
        );
        Ok(matches)
    }

    /// Forwards environment feedback to the policy.
    pub fn learn(&mut self, transitions: &[Transition]) -> Result<()> {
        let policy = self.policy.as_mut().ok_or_else(|| {
            DispatchError::IllegalState(format!("no policy initialized for {}", self.strategy))
        })?;
        policy.update(transitions)?;
        debug!("Applied {} transitions to {}", transitions.len(), policy.name());
        Ok(())
    }

    pub fn save_parameters(&self, path: &Path) -> Result<()> {
        self.policy
            .as_deref()
            .ok_or_else(|| DispatchError::IllegalState("no policy to save".into()))?
            .save(path)
    }

    pub fn load_parameters(&mut self, path: &Path) -> Result<()> {
        self.policy
            .as_mut()
            .ok_or_else(|| DispatchError::IllegalState("no policy to load into".into()))?
            .load(path)
    }

    #[cfg(test)]
    fn without_policy(mut self) -> Self {
        self.policy = None;
        self
    }
}
