//! Shared builders and doubles for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use shuttle_planner::distance::{LookupError, TravelTimeLookup};
use shuttle_planner::model::{Day, Rider, RiderId, StaffId, StaffMember, Vehicle, VehicleId};
use shuttle_planner::sequencer::{CostMatrix, TourSolver};

pub const WEEKDAYS: [Day; 5] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri];

pub fn rider(id: u32, address: &str, days: &[Day]) -> Rider {
    Rider {
        id: RiderId(id),
        name: format!("rider-{id}"),
        address: address.to_string(),
        pickup_time_morning: None,
        dropoff_time_morning: None,
        pickup_time_evening: None,
        dropoff_time_evening: None,
        constraints: String::new(),
        attendance_days: days.iter().copied().collect(),
    }
}

pub fn driver(id: u32, days: &[Day]) -> StaffMember {
    StaffMember {
        id: StaffId(id),
        name: format!("driver-{id}"),
        can_drive: true,
        workdays: days.iter().copied().collect(),
    }
}

pub fn aide(id: u32, days: &[Day]) -> StaffMember {
    StaffMember {
        id: StaffId(id),
        name: format!("aide-{id}"),
        can_drive: false,
        workdays: days.iter().copied().collect(),
    }
}

pub fn vehicle(id: u32, capacity: usize) -> Vehicle {
    Vehicle {
        id: VehicleId(id),
        name: format!("van-{id}"),
        capacity,
    }
}

/// Lookup backed by a fixed table of directed durations, recording how
/// many queries it served.
pub struct FixedLookup {
    durations: HashMap<(String, String), u32>,
    calls: Mutex<u32>,
}

impl FixedLookup {
    pub fn new(pairs: &[(&str, &str, u32)]) -> Self {
        let durations = pairs
            .iter()
            .map(|(from, to, seconds)| ((from.to_string(), to.to_string()), *seconds))
            .collect();
        Self {
            durations,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl TravelTimeLookup for FixedLookup {
    fn duration_between(&self, origin: &str, destination: &str) -> Result<u32, LookupError> {
        *self.calls.lock().unwrap() += 1;
        self.durations
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .ok_or(LookupError::Unavailable)
    }
}

/// Lookup that fails every query, driving the synthetic fallback.
pub struct FailingLookup;

impl TravelTimeLookup for FailingLookup {
    fn duration_between(&self, _origin: &str, _destination: &str) -> Result<u32, LookupError> {
        Err(LookupError::Status("OVER_QUERY_LIMIT".to_string()))
    }
}

/// Solver that never converges, for exercising the identity-order fallback.
pub struct NoSolutionSolver;

impl TourSolver for NoSolutionSolver {
    fn solve_closed_tour(&self, _costs: &CostMatrix, _limit: Duration) -> Option<Vec<usize>> {
        None
    }
}
