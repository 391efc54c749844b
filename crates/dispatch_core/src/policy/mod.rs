//! Learned value functions that score candidate edges and learn from
//! environment feedback.

pub mod sarsa;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::StrategyKind;
use crate::error::{DispatchError, Result};
use crate::spatial::{GeoPoint, Zone, ZoneScheme};

pub use sarsa::SarsaPolicy;

/// Discretized worker state: where the worker is and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    pub time_slot: u32,
    pub zone: Zone,
}

/// Discretized action: the zone the worker is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    pub target: Zone,
}

/// One feedback record. Fields are optional so incomplete records coming from
/// the environment are representable and rejected by [`ValuePolicy::update`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transition {
    pub state: Option<State>,
    pub action: Option<Action>,
    pub reward: Option<f64>,
    /// Absent together with `next_action` for terminal transitions.
    #[serde(default)]
    pub next_state: Option<State>,
    #[serde(default)]
    pub next_action: Option<Action>,
    /// Time slots between the two decisions; defaults to 1.
    #[serde(default)]
    pub duration_slots: Option<u32>,
}

impl Transition {
    pub fn new(state: State, action: Action, reward: f64) -> Self {
        Self {
            state: Some(state),
            action: Some(action),
            reward: Some(reward),
            ..Default::default()
        }
    }

    pub fn with_next(mut self, next_state: State, next_action: Action) -> Self {
        self.next_state = Some(next_state);
        self.next_action = Some(next_action);
        self
    }

    pub fn with_duration_slots(mut self, duration_slots: u32) -> Self {
        self.duration_slots = Some(duration_slots);
        self
    }
}

/// A transition whose required fields have been checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CheckedTransition {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next: Option<(State, Action)>,
    pub duration_slots: u32,
}

impl TryFrom<&Transition> for CheckedTransition {
    type Error = DispatchError;

    fn try_from(t: &Transition) -> Result<Self> {
        let state = t
            .state
            .ok_or_else(|| DispatchError::data("transition is missing its state"))?;
        let action = t
            .action
            .ok_or_else(|| DispatchError::data("transition is missing its action"))?;
        let reward = t
            .reward
            .ok_or_else(|| DispatchError::data("transition is missing its reward"))?;
        if !reward.is_finite() {
            return Err(DispatchError::data(format!("transition reward {reward} is not finite")));
        }
        let next = match (t.next_state, t.next_action) {
            (Some(s), Some(a)) => Some((s, a)),
            (None, None) => None,
            _ => {
                return Err(DispatchError::data(
                    "transition must carry both next_state and next_action, or neither",
                ))
            }
        };
        Ok(Self {
            state,
            action,
            reward,
            next,
            duration_slots: t.duration_slots.unwrap_or(1),
        })
    }
}

/// One learned value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub state: State,
    pub action: Action,
    pub value: f64,
}

/// Persisted state of a value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyParameters {
    pub strategy: StrategyKind,
    pub zone: ZoneScheme,
    pub time_slot_secs: u64,
    pub learning_rate: f64,
    pub discount: f64,
    pub initial_value: f64,
    pub updates: u64,
    /// Sorted by (state, action).
    pub values: Vec<ValueEntry>,
}

/// The contract a learned policy satisfies to plug into dispatch.
pub trait ValuePolicy: Send + Sync {
    fn name(&self) -> &str;

    /// State of a worker at `location` during the round at `timestamp_secs`.
    fn encode_state(&self, location: GeoPoint, timestamp_secs: u64) -> Result<State>;

    /// Action of sending a worker to `target`.
    fn encode_action(&self, target: GeoPoint) -> Result<Action>;

    fn action_value(&self, state: &State, action: &Action) -> f64;

    /// Applies one on-policy TD step per transition, in order. A malformed
    /// record fails the whole batch before anything is applied.
    fn update(&mut self, transitions: &[Transition]) -> Result<()>;

    fn parameters(&self) -> PolicyParameters;

    fn load(&mut self, path: &Path) -> Result<()>;

    fn save(&self, path: &Path) -> Result<()>;
}
