//! Per-round input data: requests, workers and the round snapshot.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::spatial::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// A waiting service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub origin: GeoPoint,
    /// Base weight used by [`WeightMethod::RequestWeight`].
    pub weight: f64,
    /// Seconds the request has been waiting.
    #[serde(default)]
    pub wait_secs: u64,
}

impl Request {
    pub fn new(id: u64, origin: GeoPoint, weight: f64) -> Self {
        Self {
            id: RequestId(id),
            origin,
            weight,
            wait_secs: 0,
        }
    }
}

/// Worker status, with the numeric codes the environment reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    PickingUp,
    OnTrip,
    OffDuty,
    Repositioning,
}

impl WorkerStatus {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(WorkerStatus::Idle),
            1 => Ok(WorkerStatus::PickingUp),
            2 => Ok(WorkerStatus::OnTrip),
            3 => Ok(WorkerStatus::OffDuty),
            4 => Ok(WorkerStatus::Repositioning),
            other => Err(DispatchError::data(format!("unknown worker status code {other}"))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            WorkerStatus::Idle => 0,
            WorkerStatus::PickingUp => 1,
            WorkerStatus::OnTrip => 2,
            WorkerStatus::OffDuty => 3,
            WorkerStatus::Repositioning => 4,
        }
    }

    /// Idle and repositioning workers can take a new request this round.
    pub fn is_ready(self) -> bool {
        matches!(self, WorkerStatus::Idle | WorkerStatus::Repositioning)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub location: GeoPoint,
    pub status: WorkerStatus,
}

impl Worker {
    pub fn new(id: u64, location: GeoPoint, status: WorkerStatus) -> Self {
        Self {
            id: WorkerId(id),
            location,
            status,
        }
    }
}

/// How candidate edges are weighted for the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMethod {
    /// Edge weight is the request's base weight.
    #[default]
    RequestWeight,
    /// Edge weight is `max_pickup_distance - distance + 1`.
    PickupDistance,
    /// Edge weight is the policy's action value, epsilon-greedy.
    LearnedValue,
}

/// Everything one dispatch round needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub requests: Vec<Request>,
    pub workers: Vec<Worker>,
    pub max_pickup_distance: f64,
    #[serde(default)]
    pub method: WeightMethod,
    #[serde(default)]
    pub exploration_rate: f64,
    /// Simulation time of the round, used to derive the policy's time slot.
    #[serde(default)]
    pub timestamp_secs: u64,
}

impl RoundSnapshot {
    pub fn new(requests: Vec<Request>, workers: Vec<Worker>, max_pickup_distance: f64) -> Self {
        Self {
            requests,
            workers,
            max_pickup_distance,
            method: WeightMethod::default(),
            exploration_rate: 0.0,
            timestamp_secs: 0,
        }
    }

    pub fn with_method(mut self, method: WeightMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_exploration_rate(mut self, exploration_rate: f64) -> Self {
        self.exploration_rate = exploration_rate;
        self
    }

    pub fn with_timestamp_secs(mut self, timestamp_secs: u64) -> Self {
        self.timestamp_secs = timestamp_secs;
        self
    }

    pub fn ready_workers(&self) -> impl Iterator<Item = &Worker> + '_ {
        self.workers.iter().filter(|worker| worker.status.is_ready())
    }

    pub fn ready_worker_count(&self) -> usize {
        self.ready_workers().count()
    }

    /// Rejects snapshots the round cannot be computed from.
    pub fn validate(&self) -> Result<()> {
        if !self.max_pickup_distance.is_finite() || self.max_pickup_distance < 0.0 {
            return Err(DispatchError::data(format!(
                "max_pickup_distance must be finite and non-negative, got {}",
                self.max_pickup_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(DispatchError::data(format!(
                "exploration_rate must be within [0, 1], got {}",
                self.exploration_rate
            )));
        }

        let mut request_ids = HashSet::with_capacity(self.requests.len());
        for request in &self.requests {
            if !request_ids.insert(request.id) {
                return Err(DispatchError::data(format!("duplicate request id {}", request.id)));
            }
            if !request.origin.is_finite() {
                return Err(DispatchError::data(format!(
                    "request {} has a non-finite origin",
                    request.id
                )));
            }
            if !request.weight.is_finite() || request.weight < 0.0 {
                return Err(DispatchError::data(format!(
                    "request {} has invalid weight {}",
                    request.id, request.weight
                )));
            }
        }

        let mut worker_ids = HashSet::with_capacity(self.workers.len());
        for worker in &self.workers {
            if !worker_ids.insert(worker.id) {
                return Err(DispatchError::data(format!("duplicate worker id {}", worker.id)));
            }
            if !worker.location.is_finite() {
                return Err(DispatchError::data(format!(
                    "worker {} has a non-finite location",
                    worker.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    #[test]
    fn only_idle_and_repositioning_are_ready() {
        let ready: Vec<u8> = (0..=4)
            .filter(|code| WorkerStatus::from_code(*code).unwrap().is_ready())
            .collect();
        assert_eq!(ready, vec![0, 4]);
        assert!(WorkerStatus::from_code(9).is_err());
    }

    #[test]
    fn status_codes_round_trip() {
        for code in 0..=4 {
            assert_eq!(WorkerStatus::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn validate_rejects_negative_pickup_distance() {
        let snapshot = RoundSnapshot::new(vec![], vec![], -1.0);
        assert!(matches!(snapshot.validate(), Err(DispatchError::Data(_))));
        let snapshot = RoundSnapshot::new(vec![], vec![], f64::NAN);
        assert!(matches!(snapshot.validate(), Err(DispatchError::Data(_))));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let snapshot = RoundSnapshot::new(
            vec![Request::new(1, origin(), 1.0), Request::new(1, origin(), 2.0)],
            vec![],
            1.0,
        );
        assert!(matches!(snapshot.validate(), Err(DispatchError::Data(_))));

        let snapshot = RoundSnapshot::new(
            vec![],
            vec![
                Worker::new(7, origin(), WorkerStatus::Idle),
                Worker::new(7, origin(), WorkerStatus::OffDuty),
            ],
            1.0,
        );
        assert!(matches!(snapshot.validate(), Err(DispatchError::Data(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_exploration() {
        let snapshot = RoundSnapshot::new(vec![], vec![], 1.0).with_exploration_rate(1.5);
        assert!(snapshot.validate().is_err());
        let snapshot = RoundSnapshot::new(vec![], vec![], 1.0).with_exploration_rate(1.0);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_request_weight() {
        let snapshot = RoundSnapshot::new(vec![Request::new(1, origin(), -0.5)], vec![], 1.0);
        assert!(snapshot.validate().is_err());
    }
}
