//! Tabular SARSA over (time slot, zone) states and target-zone actions.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::{StrategyKind, StrategyParams};
use crate::error::{DispatchError, Result};
use crate::spatial::{GeoPoint, ZoneScheme};

use super::{Action, CheckedTransition, PolicyParameters, State, Transition, ValueEntry, ValuePolicy};

type ValueTable = HashMap<(State, Action), f64>;

#[derive(Debug, Clone)]
pub struct SarsaPolicy {
    strategy: StrategyKind,
    learning_rate: f64,
    discount: f64,
    initial_value: f64,
    time_slot_secs: u64,
    zone: ZoneScheme,
    values: ValueTable,
    updates: u64,
}

impl SarsaPolicy {
    pub fn new(strategy: StrategyKind, params: &StrategyParams) -> Self {
        Self {
            strategy,
            learning_rate: params.learning_rate,
            discount: params.discount,
            initial_value: params.initial_value,
            time_slot_secs: params.time_slot_secs,
            zone: params.zone,
            values: HashMap::new(),
            updates: 0,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Number of state-action pairs with a learned value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    fn value(&self, state: &State, action: &Action) -> f64 {
        self.values
            .get(&(*state, *action))
            .copied()
            .unwrap_or(self.initial_value)
    }

    /// Value as seen mid-batch: pending updates shadow the table.
    fn staged_value(&self, staged: &ValueTable, state: &State, action: &Action) -> f64 {
        staged
            .get(&(*state, *action))
            .copied()
            .unwrap_or_else(|| self.value(state, action))
    }

    /// TD step for one transition; a non-finite result is a data error.
    fn updated_value(&self, staged: &ValueTable, t: &CheckedTransition) -> Result<f64> {
        let current = self.staged_value(staged, &t.state, &t.action);
        let bootstrap = t.next.map_or(0.0, |(next_state, next_action)| {
            let exponent = i32::try_from(t.duration_slots).unwrap_or(i32::MAX);
            self.discount.powi(exponent) * self.staged_value(staged, &next_state, &next_action)
        });
        let target = t.reward + bootstrap;
        let updated = (1.0 - self.learning_rate) * current + self.learning_rate * target;
        if !updated.is_finite() {
            return Err(DispatchError::data(format!(
                "update of ({:?}, {:?}) with reward {} overflows the value range",
                t.state, t.action, t.reward
            )));
        }
        Ok(updated)
    }

    fn adopt(&mut self, params: PolicyParameters, path: &Path) -> Result<()> {
        if params.strategy != self.strategy {
            return Err(DispatchError::configuration(format!(
                "parameters at {} were trained for {}, not {}",
                path.display(),
                params.strategy,
                self.strategy
            )));
        }
        if params.zone != self.zone || params.time_slot_secs != self.time_slot_secs {
            return Err(DispatchError::configuration(format!(
                "parameters at {} use a different state discretization",
                path.display()
            )));
        }
        self.initial_value = params.initial_value;
        self.updates = params.updates;
        self.values = params
            .values
            .into_iter()
            .map(|entry| ((entry.state, entry.action), entry.value))
            .collect();
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl ValuePolicy for SarsaPolicy {
    fn name(&self) -> &str {
        self.strategy.as_str()
    }

    fn encode_state(&self, location: GeoPoint, timestamp_secs: u64) -> Result<State> {
        let slot = timestamp_secs / self.time_slot_secs;
        Ok(State {
            time_slot: u32::try_from(slot).unwrap_or(u32::MAX),
            zone: self.zone.zone_of(location)?,
        })
    }

    fn encode_action(&self, target: GeoPoint) -> Result<Action> {
        Ok(Action {
            target: self.zone.zone_of(target)?,
        })
    }

    fn action_value(&self, state: &State, action: &Action) -> f64 {
        self.value(state, action)
    }

    fn update(&mut self, transitions: &[Transition]) -> Result<()> {
        let checked = transitions
            .iter()
            .map(CheckedTransition::try_from)
            .collect::<Result<Vec<_>>>()?;
        let mut staged = ValueTable::new();
        for t in &checked {
            let updated = self.updated_value(&staged, t)?;
            staged.insert((t.state, t.action), updated);
        }
        self.values.extend(staged);
        self.updates += checked.len() as u64;
        Ok(())
    }

    fn parameters(&self) -> PolicyParameters {
        let mut values: Vec<ValueEntry> = self
            .values
            .iter()
            .map(|(&(state, action), &value)| ValueEntry { state, action, value })
            .collect();
        values.sort_by(|a, b| (a.state, a.action).cmp(&(b.state, b.action)));
        PolicyParameters {
            strategy: self.strategy,
            zone: self.zone,
            time_slot_secs: self.time_slot_secs,
            learning_rate: self.learning_rate,
            discount: self.discount,
            initial_value: self.initial_value,
            updates: self.updates,
            values,
        }
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path).map_err(|err| DispatchError::NotFound {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let params: PolicyParameters =
            serde_json::from_slice(&bytes).map_err(|err| DispatchError::NotFound {
                path: path.to_path_buf(),
                reason: format!("not a parameters file: {err}"),
            })?;
        self.adopt(params, path)?;
        info!(
            "Loaded {} values ({} updates) for {} from {}",
            self.values.len(),
            self.updates,
            self.strategy,
            path.display()
        );
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source: io::Error| DispatchError::Io {
            path: path.to_path_buf(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(&self.parameters())
            .map_err(|err| io_err(io::Error::other(err)))?;
        let tmp = temp_path(path);
        fs::write(&tmp, bytes).map_err(io_err)?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(err));
        }
        info!(
            "Saved {} values for {} to {}",
            self.values.len(),
            self.strategy,
            path.display()
        );
        Ok(())
    }
}
