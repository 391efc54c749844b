//! Strategy selection and strategy parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::spatial::{DistanceMetric, ZoneScheme};

/// Supported strategy variants. All of them use the SARSA value table; the
/// variants differ in how the environment shapes the reward it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sarsa,
    SarsaNoSubway,
    SarsaTravelTime,
    SarsaTravelTimeNoSubway,
    SarsaTotalTravelTime,
    SarsaTotalTravelTimeNoSubway,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Sarsa,
        StrategyKind::SarsaNoSubway,
        StrategyKind::SarsaTravelTime,
        StrategyKind::SarsaTravelTimeNoSubway,
        StrategyKind::SarsaTotalTravelTime,
        StrategyKind::SarsaTotalTravelTimeNoSubway,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Sarsa => "sarsa",
            StrategyKind::SarsaNoSubway => "sarsa_no_subway",
            StrategyKind::SarsaTravelTime => "sarsa_travel_time",
            StrategyKind::SarsaTravelTimeNoSubway => "sarsa_travel_time_no_subway",
            StrategyKind::SarsaTotalTravelTime => "sarsa_total_travel_time",
            StrategyKind::SarsaTotalTravelTimeNoSubway => "sarsa_total_travel_time_no_subway",
        }
    }

    /// Whether the environment feeding this strategy includes subway legs.
    pub fn uses_subway(self) -> bool {
        !matches!(
            self,
            StrategyKind::SarsaNoSubway
                | StrategyKind::SarsaTravelTimeNoSubway
                | StrategyKind::SarsaTotalTravelTimeNoSubway
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DispatchError::configuration(format!("unsupported strategy type: {s}")))
    }
}

/// Assignment algorithm used to turn weighted candidates into a matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Greedy,
    Hungarian,
}

const DEFAULT_LEARNING_RATE: f64 = 0.1;
const DEFAULT_DISCOUNT: f64 = 0.9;
const DEFAULT_TIME_SLOT_SECS: u64 = 600;

/// Strategy parameters, parsed from the configuration map handed to
/// [`crate::DispatchAgent::new`]. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    /// Step size alpha of the temporal-difference update.
    pub learning_rate: f64,
    /// Discount factor gamma applied per elapsed time slot.
    pub discount: f64,
    /// Value of state-action pairs that were never updated.
    pub initial_value: f64,
    pub time_slot_secs: u64,
    pub zone: ZoneScheme,
    pub metric: DistanceMetric,
    pub solver: SolverKind,
    /// Seed for the exploration RNG; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount: DEFAULT_DISCOUNT,
            initial_value: 0.0,
            time_slot_secs: DEFAULT_TIME_SLOT_SECS,
            zone: ZoneScheme::default(),
            metric: DistanceMetric::default(),
            solver: SolverKind::default(),
            seed: None,
        }
    }
}

impl StrategyParams {
    /// Parses and validates a configuration map. `null` means all defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let params: StrategyParams = if value.is_null() {
            StrategyParams::default()
        } else {
            serde_json::from_value(value).map_err(|err| {
                DispatchError::configuration(format!("invalid strategy parameters: {err}"))
            })?
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(DispatchError::configuration(format!(
                "learning_rate must be within (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(DispatchError::configuration(format!(
                "discount must be within [0, 1], got {}",
                self.discount
            )));
        }
        if !self.initial_value.is_finite() {
            return Err(DispatchError::configuration("initial_value must be finite"));
        }
        if self.time_slot_secs == 0 {
            return Err(DispatchError::configuration("time_slot_secs must be positive"));
        }
        self.zone.validate()
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    pub fn with_time_slot_secs(mut self, time_slot_secs: u64) -> Self {
        self.time_slot_secs = time_slot_secs;
        self
    }

    pub fn with_zone(mut self, zone: ZoneScheme) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
