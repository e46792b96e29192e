//! Greedy vehicle, driver, and aide allocation for a single day.
//!
//! Vehicles are filled in priority order with the next riders in input
//! order; spatial optimality is deferred entirely to the stop sequencer.

use std::collections::HashSet;

use crate::model::{Day, Rider, RiderId, StaffId, StaffMember, Vehicle, VehicleId};

/// One vehicle's share of the day: its crew and rider subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleGroup {
    pub vehicle: VehicleId,
    pub driver: StaffId,
    pub aide: Option<StaffId>,
    pub riders: Vec<RiderId>,
}

/// Outcome of one allocation pass. Riders no vehicle could take are
/// reported here instead of silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub groups: Vec<VehicleGroup>,
    pub unassigned: Vec<RiderId>,
}

/// Single greedy pass over `vehicles` in input order.
///
/// A driver must be drive-capable, working `day`, and not yet assigned to
/// an earlier vehicle. The aide is the first remaining staff member working
/// that day who is not the driver; once chosen, the aide is off the pool
/// for later vehicles too. Allocation stops as soon as riders or eligible
/// drivers run out.
pub fn allocate(
    riders: &[Rider],
    vehicles: &[Vehicle],
    staff: &[StaffMember],
    day: Day,
) -> Allocation {
    let mut assigned_staff: HashSet<StaffId> = HashSet::new();
    let mut groups = Vec::new();
    let mut next = 0usize;

    for vehicle in vehicles {
        if next >= riders.len() {
            break;
        }
        if vehicle.capacity == 0 {
            continue;
        }

        let Some(driver) = staff
            .iter()
            .find(|member| {
                member.can_drive && member.works(day) && !assigned_staff.contains(&member.id)
            })
        else {
            break;
        };
        assigned_staff.insert(driver.id);

        let take = vehicle.capacity.min(riders.len() - next);
        let group_riders: Vec<RiderId> = riders[next..next + take]
            .iter()
            .map(|rider| rider.id)
            .collect();
        next += take;

        let aide = staff
            .iter()
            .find(|member| {
                member.id != driver.id && member.works(day) && !assigned_staff.contains(&member.id)
            })
            .map(|member| member.id);
        if let Some(aide) = aide {
            assigned_staff.insert(aide);
        }

        groups.push(VehicleGroup {
            vehicle: vehicle.id,
            driver: driver.id,
            aide,
            riders: group_riders,
        });
    }

    let unassigned = riders[next..].iter().map(|rider| rider.id).collect();
    Allocation { groups, unassigned }
}
