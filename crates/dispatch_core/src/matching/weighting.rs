//! Edge weighting: static heuristics or learned action values.

use std::collections::HashMap;

use rand::Rng;

use crate::error::{DispatchError, Result};
use crate::policy::ValuePolicy;
use crate::spatial::GeoPoint;
use crate::types::{RequestId, RoundSnapshot, WeightMethod, WorkerId};

use super::types::CandidateEdge;

/// Sets the weight of every edge according to the snapshot's method.
///
/// `LearnedValue` needs a policy; with probability `exploration_rate` each
/// learned weight is replaced by a uniform draw over the round's range of
/// learned weights. At rate 0 the RNG is never touched.
pub fn assign_weights<R: Rng + ?Sized>(
    edges: &mut [CandidateEdge],
    snapshot: &RoundSnapshot,
    policy: Option<&dyn ValuePolicy>,
    rng: &mut R,
) -> Result<()> {
    match snapshot.method {
        WeightMethod::RequestWeight => {
            let weights: HashMap<RequestId, f64> = snapshot
                .requests
                .iter()
                .map(|request| (request.id, request.weight))
                .collect();
            for edge in edges.iter_mut() {
                edge.weight = weights.get(&edge.request).copied().ok_or_else(|| {
                    DispatchError::data(format!("edge references unknown request {}", edge.request))
                })?;
            }
        }
        WeightMethod::PickupDistance => {
            for edge in edges.iter_mut() {
                edge.weight = snapshot.max_pickup_distance - edge.distance + 1.0;
            }
        }
        WeightMethod::LearnedValue => {
            let policy = policy.ok_or_else(|| {
                DispatchError::IllegalState("learned weighting requested without a policy".into())
            })?;
            learned_weights(edges, snapshot, policy)?;
            explore(edges, snapshot.exploration_rate, rng);
        }
    }
    Ok(())
}

fn learned_weights(
    edges: &mut [CandidateEdge],
    snapshot: &RoundSnapshot,
    policy: &dyn ValuePolicy,
) -> Result<()> {
    let origins: HashMap<RequestId, GeoPoint> = snapshot
        .requests
        .iter()
        .map(|request| (request.id, request.origin))
        .collect();
    let locations: HashMap<WorkerId, GeoPoint> = snapshot
        .ready_workers()
        .map(|worker| (worker.id, worker.location))
        .collect();

    let mut states = HashMap::with_capacity(locations.len());
    let mut actions = HashMap::with_capacity(origins.len());
    for edge in edges.iter_mut() {
        let state = match states.get(&edge.worker) {
            Some(state) => *state,
            None => {
                let location = locations.get(&edge.worker).ok_or_else(|| {
                    DispatchError::data(format!("edge references unknown worker {}", edge.worker))
                })?;
                let state = policy.encode_state(*location, snapshot.timestamp_secs)?;
                states.insert(edge.worker, state);
                state
            }
        };
        let action = match actions.get(&edge.request) {
            Some(action) => *action,
            None => {
                let origin = origins.get(&edge.request).ok_or_else(|| {
                    DispatchError::data(format!("edge references unknown request {}", edge.request))
                })?;
                let action = policy.encode_action(*origin)?;
                actions.insert(edge.request, action);
                action
            }
        };
        edge.weight = policy.action_value(&state, &action);
    }
    Ok(())
}

fn explore<R: Rng + ?Sized>(edges: &mut [CandidateEdge], exploration_rate: f64, rng: &mut R) {
    if exploration_rate <= 0.0 || edges.is_empty() {
        return;
    }
    let (lo, hi) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.weight), hi.max(e.weight))
    });
    for edge in edges.iter_mut() {
        if rng.gen_bool(exploration_rate) {
            edge.weight = if hi > lo { uniform_between(lo, hi, rng) } else { lo };
        }
    }
}

/// Uniform draw in `[lo, hi]` that stays finite when `hi - lo` overflows.
fn uniform_between<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    let t: f64 = rng.gen();
    let span = hi - lo;
    let value = if span.is_finite() {
        lo + t * span
    } else {
        lo * (1.0 - t) + hi * t
    };
    value.clamp(lo, hi)
}
