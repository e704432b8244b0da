//! Wear accumulation over the ride ledger.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{ComponentBaseline, RideRecord};

const FEET_PER_MILE: f64 = 5280.0;

/// Per-ride wear signals, retained for driver attribution.
#[derive(Debug, Clone)]
pub struct RideWear {
    pub ride_id: String,
    pub hours: f64,
    pub distance_miles: f64,
    pub elevation_gain_feet: f64,
    /// Average grade of the ride as a percentage; 0 when distance is unknown.
    pub grade_percent: f64,
    pub avg_speed_mph: f64,
    pub temperature_f: Option<f64>,
    /// 0.0-1.0 severity derived from the free-form conditions tag.
    pub condition_severity: f64,
}

/// Result of folding the ride ledger since the last service event.
#[derive(Debug, Clone)]
pub struct WearAccumulation {
    /// Ride hours since the last service, plus the baseline carry-over
    /// when no service was ever logged.
    pub hours_since_service: f64,
    /// Hours attributed to the starting wear baseline rather than rides.
    pub carry_over_hours: f64,
    /// Total hours on the component since installation.
    pub lifetime_hours: f64,
    pub window_start: DateTime<Utc>,
    /// Rides inside the accumulation window, in ledger order.
    pub rides: Vec<RideWear>,
}

/// Folds the ride ledger into cumulative wear for one component.
///
/// Rides with a missing start time or a negative/non-finite duration are
/// skipped; they never fail the computation. Pure function of its inputs,
/// so recomputation from the same ledger and baseline is idempotent.
pub fn accumulate(baseline: &ComponentBaseline, rides: &[RideRecord]) -> WearAccumulation {
    let window_start = baseline.last_serviced_at.unwrap_or(baseline.installed_at);

    // Starting wear only applies while no service has ever been logged;
    // the first real service resets the reference point.
    let carry_percent = baseline
        .baseline_wear_percent
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0))
        .unwrap_or(0.0);
    let carry_for = |interval: f64| {
        if interval.is_finite() && interval > 0.0 {
            carry_percent / 100.0 * interval
        } else {
            0.0
        }
    };
    let carry_over_hours = if baseline.last_serviced_at.is_none() {
        carry_for(baseline.service_interval_hours)
    } else {
        0.0
    };

    let mut window_rides = Vec::new();
    let mut window_hours = 0.0;
    let mut lifetime_hours = carry_for(baseline.service_interval_hours);

    for ride in rides {
        let Some(start) = ride.start_time else {
            debug!(ride_id = %ride.id, "Skipping ride without start time");
            continue;
        };
        let Some(hours) = duration_hours(ride.duration_seconds) else {
            debug!(ride_id = %ride.id, "Skipping ride with invalid duration");
            continue;
        };

        if start >= baseline.installed_at {
            lifetime_hours += hours;
        }
        if start < window_start {
            continue;
        }

        window_hours += hours;
        window_rides.push(ride_wear(ride, hours));
    }

    WearAccumulation {
        hours_since_service: carry_over_hours + window_hours,
        carry_over_hours,
        lifetime_hours,
        window_start,
        rides: window_rides,
    }
}

fn duration_hours(duration_seconds: f64) -> Option<f64> {
    if duration_seconds.is_finite() && duration_seconds >= 0.0 {
        Some(duration_seconds / 3600.0)
    } else {
        None
    }
}

fn ride_wear(ride: &RideRecord, hours: f64) -> RideWear {
    let distance = sanitize(ride.distance_miles);
    let elevation = sanitize(ride.elevation_gain_feet);
    let grade_percent = if distance > 0.0 {
        elevation / (distance * FEET_PER_MILE) * 100.0
    } else {
        0.0
    };

    RideWear {
        ride_id: ride.id.clone(),
        hours,
        distance_miles: distance,
        elevation_gain_feet: elevation,
        grade_percent,
        avg_speed_mph: ride.avg_speed_mph.map(sanitize).unwrap_or(0.0),
        temperature_f: ride.temperature_f.filter(|t| t.is_finite()),
        condition_severity: condition_severity(ride.conditions.as_deref()),
    }
}

/// Clamps a possibly-missing numeric signal to a non-negative finite value.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Maps a free-form conditions tag to an abrasiveness severity.
fn condition_severity(tag: Option<&str>) -> f64 {
    let Some(tag) = tag else { return 0.0 };
    let tag = tag.to_ascii_lowercase();
    if tag.contains("mud") {
        1.0
    } else if tag.contains("snow") {
        0.9
    } else if tag.contains("wet") || tag.contains("rain") {
        0.8
    } else if tag.contains("dust") {
        0.5
    } else if tag.contains("dry") {
        0.0
    } else {
        0.25
    }
}
