//! Domain records shared between the roster source and the engine.
//!
//! Riders, staff, and vehicles are owned by the hosting application's
//! roster and passed in read-only for each optimization pass. Routes and
//! their stops are the engine's output and reference roster entities by id.

use std::collections::HashSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub u32);

/// Day of week used for attendance and work schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    /// Default operating days, Monday through Saturday.
    pub const WEEK: [Day; 6] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri, Day::Sat];
}

/// Transport direction: morning runs facility -> riders, evening runs
/// riders -> facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    Morning,
    Evening,
}

impl Leg {
    /// Facility anchor time when the settings source supplies none:
    /// 08:30 departure for morning, 16:00 arrival for evening.
    pub fn default_anchor(self) -> NaiveTime {
        let (hour, minute) = match self {
            Leg::Morning => (8, 30),
            Leg::Evening => (16, 0),
        };
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
    }
}

/// A person transported between home and the facility.
///
/// The preferred-time strings and `constraints` are roster data carried for
/// the export collaborators; the engine reads only `address` and
/// `attendance_days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    pub name: String,
    pub address: String,
    pub pickup_time_morning: Option<String>,
    pub dropoff_time_morning: Option<String>,
    pub pickup_time_evening: Option<String>,
    pub dropoff_time_evening: Option<String>,
    pub constraints: String,
    pub attendance_days: HashSet<Day>,
}

impl Rider {
    pub fn attends(&self, day: Day) -> bool {
        self.attendance_days.contains(&day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub can_drive: bool,
    pub workdays: HashSet<Day>,
}

impl StaffMember {
    pub fn works(&self, day: Day) -> bool {
        self.workdays.contains(&day)
    }
}

/// Seat capacity counts riders only, not the driver or aide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub capacity: usize,
}

/// One stop on a route. `rider` is absent for the facility stop.
///
/// Flag semantics follow the schedule exports: on the morning leg the
/// facility departure carries `is_pickup = false` and rider stops `true`;
/// on the evening leg rider dropoffs carry `false` and the facility
/// arrival `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    pub rider: Option<RiderId>,
    pub is_pickup: bool,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

/// A timed multi-stop run for one vehicle on one (day, leg).
///
/// The stop list always holds exactly one facility stop plus one stop per
/// assigned rider, ordered chronologically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub vehicle: VehicleId,
    pub driver: StaffId,
    pub aide: Option<StaffId>,
    pub stops: Vec<RouteStop>,
    pub day: Day,
    pub leg: Leg,
}

/// Zero-padded `HH:MM` serialization for stop times. The export
/// collaborators sort these strings lexicographically, which is only
/// correct with fixed-width formatting.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M").map_err(serde::de::Error::custom)
    }
}
