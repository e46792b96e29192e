//! End-to-end route optimization for one (day, leg) pass and for the whole
//! week.
//!
//! The pipeline is synchronous: allocate riders to vehicles, fetch the
//! travel-time matrix once for the full rider set, then per vehicle solve
//! the stop order and propagate times. A full week can block for the sum of
//! solver caps plus network latency, so hosts should run it off the
//! interactive thread and use the cancellation token.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveTime;
use tracing::{info, warn};

use crate::allocator::{Allocation, allocate};
use crate::distance::{
    DistanceProvider, GoogleMatrixClient, GoogleMatrixConfig, OfflineLookup, TravelTimeLookup,
};
use crate::model::{Day, Leg, Rider, RiderId, Route, RouteId, StaffMember, Vehicle};
use crate::propagator::propagate_times;
use crate::sequencer::{CheapestArcSolver, CostMatrix, TourSolver, sequence_stops};

/// Engine settings supplied by the hosting application's settings source.
///
/// The API key is only used to choose between the live and synthetic
/// lookup; the engine never validates it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub facility_address: String,
    pub api_key: Option<String>,
    pub operating_days: Vec<Day>,
    pub morning_anchor: NaiveTime,
    pub evening_anchor: NaiveTime,
    /// Wall-clock cap per vehicle sub-problem.
    pub solver_time_limit: Duration,
    pub cache_path: Option<PathBuf>,
}

impl Settings {
    pub fn new(facility_address: impl Into<String>) -> Self {
        Self {
            facility_address: facility_address.into(),
            api_key: None,
            operating_days: Day::WEEK.to_vec(),
            morning_anchor: Leg::Morning.default_anchor(),
            evening_anchor: Leg::Evening.default_anchor(),
            solver_time_limit: Duration::from_secs(10),
            cache_path: None,
        }
    }

    fn anchor(&self, leg: Leg) -> NaiveTime {
        match leg {
            Leg::Morning => self.morning_anchor,
            Leg::Evening => self.evening_anchor,
        }
    }
}

/// Cooperative cancellation, checked between vehicle sub-problems (the
/// solver itself is not preemptible mid-call).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Routes produced by an optimization pass plus the riders that could not
/// be seated, so callers can report the shortfall instead of discovering
/// it by omission. Over a weekly run a rider appears once per missed pass.
#[derive(Debug, Clone, Default)]
pub struct OptimizeOutcome {
    pub routes: Vec<Route>,
    pub unassigned: Vec<RiderId>,
}

/// The orchestrator. Owns the distance provider (and through it the single
/// cache handle) for the duration of a run; concurrent runs against one
/// cache file must be serialized by the host.
pub struct Optimizer<L, S = CheapestArcSolver> {
    settings: Settings,
    provider: DistanceProvider<L>,
    solver: S,
    cancel: CancelToken,
}

impl Optimizer<Box<dyn TravelTimeLookup>, CheapestArcSolver> {
    /// Builds an optimizer from settings alone: a configured API key
    /// selects the live lookup, otherwise every batch is synthetic.
    pub fn from_settings(settings: Settings) -> Result<Self, reqwest::Error> {
        let lookup: Box<dyn TravelTimeLookup> = match &settings.api_key {
            Some(key) => Box::new(GoogleMatrixClient::new(GoogleMatrixConfig::new(key.clone()))?),
            None => Box::new(OfflineLookup),
        };
        Ok(Self::new(settings, lookup))
    }
}

impl<L: TravelTimeLookup> Optimizer<L, CheapestArcSolver> {
    pub fn new(settings: Settings, lookup: L) -> Self {
        Self::with_solver(settings, lookup, CheapestArcSolver)
    }
}

impl<L: TravelTimeLookup, S: TourSolver> Optimizer<L, S> {
    pub fn with_solver(settings: Settings, lookup: L, solver: S) -> Self {
        let provider = match &settings.cache_path {
            Some(path) => DistanceProvider::with_cache_file(lookup, path),
            None => DistanceProvider::new(lookup),
        };
        Self {
            settings,
            provider,
            solver,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn provider(&self) -> &DistanceProvider<L> {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut DistanceProvider<L> {
        &mut self.provider
    }

    /// One optimization pass for `day` and `leg`.
    ///
    /// Attendance filtering is the caller's job; `riders` is taken as the
    /// day's full rider set. Empty rosters yield an empty outcome; a day
    /// with no eligible driver yields no routes and reports every rider
    /// unassigned.
    pub fn optimize(
        &mut self,
        riders: &[Rider],
        vehicles: &[Vehicle],
        staff: &[StaffMember],
        day: Day,
        leg: Leg,
    ) -> OptimizeOutcome {
        if riders.is_empty() || vehicles.is_empty() || staff.is_empty() {
            return OptimizeOutcome::default();
        }

        let has_driver = staff
            .iter()
            .any(|member| member.can_drive && member.works(day));
        if !has_driver {
            warn!(?day, "no eligible driver, skipping day");
            return OptimizeOutcome {
                routes: Vec::new(),
                unassigned: riders.iter().map(|rider| rider.id).collect(),
            };
        }

        let addresses: Vec<String> = riders.iter().map(|rider| rider.address.clone()).collect();
        let matrix = self
            .provider
            .matrix_for(&self.settings.facility_address, &addresses);

        let Allocation {
            groups,
            mut unassigned,
        } = allocate(riders, vehicles, staff, day);

        let anchor = self.settings.anchor(leg);
        let mut routes = Vec::with_capacity(groups.len());
        let mut groups = groups.into_iter();
        while let Some(group) = groups.next() {
            if self.cancel.is_cancelled() {
                warn!(?day, ?leg, "optimization cancelled, remaining vehicles skipped");
                unassigned.extend(group.riders);
                for rest in groups.by_ref() {
                    unassigned.extend(rest.riders);
                }
                break;
            }

            // Global matrix rows for this group; the facility is row 0.
            let global_rows: Vec<usize> = group
                .riders
                .iter()
                .filter_map(|&id| riders.iter().position(|rider| rider.id == id))
                .map(|index| index + 1)
                .collect();

            let costs = CostMatrix::for_subset(&matrix, &global_rows);
            let order = sequence_stops(&self.solver, &costs, self.settings.solver_time_limit);
            let stops = propagate_times(&order, &costs, &group.riders, leg, anchor);

            routes.push(Route {
                id: RouteId(routes.len() as u32 + 1),
                vehicle: group.vehicle,
                driver: group.driver,
                aide: group.aide,
                stops,
                day,
                leg,
            });
        }

        info!(
            ?day,
            ?leg,
            routes = routes.len(),
            unassigned = unassigned.len(),
            "optimization pass complete"
        );
        OptimizeOutcome { routes, unassigned }
    }

    /// Runs morning and evening legs for every operating day that has at
    /// least one attending rider, renumbering route ids sequentially
    /// across the whole week.
    pub fn optimize_week(
        &mut self,
        riders: &[Rider],
        vehicles: &[Vehicle],
        staff: &[StaffMember],
    ) -> OptimizeOutcome {
        let mut routes = Vec::new();
        let mut unassigned = Vec::new();
        let days = self.settings.operating_days.clone();

        for day in days {
            let day_riders: Vec<Rider> = riders
                .iter()
                .filter(|rider| rider.attends(day))
                .cloned()
                .collect();
            if day_riders.is_empty() {
                continue;
            }

            for leg in [Leg::Morning, Leg::Evening] {
                let outcome = self.optimize(&day_riders, vehicles, staff, day, leg);
                for mut route in outcome.routes {
                    route.id = RouteId(routes.len() as u32 + 1);
                    routes.push(route);
                }
                unassigned.extend(outcome.unassigned);
            }
        }

        OptimizeOutcome { routes, unassigned }
    }
}
