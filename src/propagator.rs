//! Stop-time computation.
//!
//! Morning walks forward from the facility departure anchor; evening walks
//! the visiting order backward from the facility arrival anchor and sorts
//! the result, since backward construction emits stops out of order.

use chrono::{Duration, NaiveTime};

use crate::model::{Leg, RiderId, RouteStop};
use crate::sequencer::CostMatrix;

/// Offset subtracted when the backward walk has no next-stop duration left
/// to work with.
const EVENING_PLACEHOLDER_MINUTES: i64 = 15;

/// Turns a visiting order into the route's timed stop list.
///
/// `order` is the local visiting order (0 = facility); `riders[k]` is the
/// rider at local index `k + 1`. With no riders in the order the result is
/// the facility stop alone.
pub fn propagate_times(
    order: &[usize],
    costs: &CostMatrix,
    riders: &[RiderId],
    leg: Leg,
    anchor: NaiveTime,
) -> Vec<RouteStop> {
    match leg {
        Leg::Morning => forward_walk(order, costs, riders, anchor),
        Leg::Evening => backward_walk(order, costs, riders, anchor),
    }
}

fn forward_walk(
    order: &[usize],
    costs: &CostMatrix,
    riders: &[RiderId],
    anchor: NaiveTime,
) -> Vec<RouteStop> {
    let mut stops = Vec::with_capacity(order.len() + 1);
    let mut current = anchor;
    stops.push(RouteStop {
        rider: None,
        is_pickup: false,
        time: current,
    });

    let mut last = 0usize;
    for &idx in order {
        if idx == 0 {
            continue;
        }
        current = current + Duration::seconds(costs.cost(last, idx) as i64);
        stops.push(RouteStop {
            rider: Some(riders[idx - 1]),
            is_pickup: true,
            time: current,
        });
        last = idx;
    }

    stops
}

fn backward_walk(
    order: &[usize],
    costs: &CostMatrix,
    riders: &[RiderId],
    anchor: NaiveTime,
) -> Vec<RouteStop> {
    let mut stops = Vec::with_capacity(order.len() + 1);
    let mut current = anchor;
    let reversed: Vec<usize> = order.iter().rev().copied().collect();

    for (i, &idx) in reversed.iter().enumerate() {
        if idx == 0 {
            continue;
        }
        // Each dropoff is offset from the running clock by the arc toward
        // the stop that follows in the reversed walk.
        current = match reversed.get(i + 1) {
            Some(&next) => current - Duration::seconds(costs.cost(idx, next) as i64),
            None => current - Duration::minutes(EVENING_PLACEHOLDER_MINUTES),
        };
        stops.push(RouteStop {
            rider: Some(riders[idx - 1]),
            is_pickup: false,
            time: current,
        });
    }

    stops.push(RouteStop {
        rider: None,
        is_pickup: true,
        time: anchor,
    });
    stops.sort_by_key(|stop| stop.time);
    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiderId;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn morning_walk_accumulates_travel() {
        // facility -> r1 = 10 min, r1 -> r2 = 5 min
        let costs = CostMatrix::from_raw(vec![
            vec![0, 600, 1200],
            vec![600, 0, 300],
            vec![1200, 300, 0],
        ]);
        let riders = [RiderId(1), RiderId(2)];
        let stops = propagate_times(&[0, 1, 2], &costs, &riders, Leg::Morning, time(8, 30));

        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0].rider, None);
        assert!(!stops[0].is_pickup);
        assert_eq!(stops[0].time, time(8, 30));
        assert_eq!(stops[1].rider, Some(RiderId(1)));
        assert!(stops[1].is_pickup);
        assert_eq!(stops[1].time, time(8, 40));
        assert_eq!(stops[2].rider, Some(RiderId(2)));
        assert_eq!(stops[2].time, time(8, 45));
    }

    #[test]
    fn evening_single_rider_offsets_from_anchor() {
        let costs = CostMatrix::from_raw(vec![vec![0, 900], vec![900, 0]]);
        let riders = [RiderId(7)];
        let stops = propagate_times(&[0, 1], &costs, &riders, Leg::Evening, time(16, 0));

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].rider, Some(RiderId(7)));
        assert!(!stops[0].is_pickup);
        assert_eq!(stops[0].time, time(15, 45));
        assert_eq!(stops[1].rider, None);
        assert!(stops[1].is_pickup);
        assert_eq!(stops[1].time, time(16, 0));
    }

    #[test]
    fn evening_stops_sorted_ascending() {
        let costs = CostMatrix::from_raw(vec![
            vec![0, 600, 1200],
            vec![600, 0, 300],
            vec![1200, 300, 0],
        ]);
        let riders = [RiderId(1), RiderId(2)];
        let stops = propagate_times(&[0, 1, 2], &costs, &riders, Leg::Evening, time(16, 0));

        assert_eq!(stops.len(), 3);
        for pair in stops.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
        assert_eq!(stops[2].rider, None, "facility arrival is last");
        assert_eq!(stops[2].time, time(16, 0));
    }

    #[test]
    fn backward_walk_without_successor_uses_placeholder() {
        // Contrived order with no depot entry after the rider: the walk
        // runs out of next-stop durations and applies the fixed offset.
        let costs = CostMatrix::from_raw(vec![vec![0, 900], vec![900, 0]]);
        let riders = [RiderId(3)];
        let stops = propagate_times(&[1], &costs, &riders, Leg::Evening, time(16, 0));

        assert_eq!(stops[0].time, time(15, 45));
    }

    #[test]
    fn empty_order_yields_facility_stop_only() {
        let costs = CostMatrix::from_raw(vec![vec![0]]);
        let morning = propagate_times(&[0], &costs, &[], Leg::Morning, time(8, 30));
        assert_eq!(morning.len(), 1);
        assert_eq!(morning[0].rider, None);

        let evening = propagate_times(&[0], &costs, &[], Leg::Evening, time(16, 0));
        assert_eq!(evening.len(), 1);
        assert_eq!(evening[0].rider, None);
    }
}
