//! Wear driver attribution.
//!
//! Decomposes a component's accumulated wear into normalized percentage
//! contributions per causal factor, aggregated over the accumulation
//! window and capped to the top contributors.

use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::engine::accumulate::{RideWear, WearAccumulation};
use crate::model::WearDriver;

pub struct FactorDef {
    pub key: &'static str,
    pub label: &'static str,
    definition: &'static str,
}

/// The recognized wear factors in canonical order. Contribution ties
/// resolve in this order.
pub static FACTORS: &[FactorDef] = &[
    FactorDef {
        key: "steepness",
        label: "Steep terrain",
        definition: "Average grade of the terrain ridden. Steeper trails load suspension, brakes, and drivetrain harder per hour.",
    },
    FactorDef {
        key: "hours",
        label: "Riding hours",
        definition: "Total time on the bike since the last service.",
    },
    FactorDef {
        key: "climbing",
        label: "Climbing",
        definition: "Total elevation gained. Sustained climbing heats and wears the drivetrain.",
    },
    FactorDef {
        key: "distance",
        label: "Distance",
        definition: "Total miles ridden since the last service.",
    },
    FactorDef {
        key: "speed",
        label: "High speed",
        definition: "Time spent above cruising speed. Faster riding raises impact and braking loads.",
    },
    FactorDef {
        key: "temperature",
        label: "Temperature",
        definition: "Riding far from moderate temperatures stresses seals and lubricants.",
    },
    FactorDef {
        key: "conditions",
        label: "Trail conditions",
        definition: "Wet, muddy, or dusty rides accelerate abrasive wear.",
    },
];

/// Fixed human-readable definition for a factor key. Unknown keys get a
/// generic fallback rather than an error.
pub fn definition(key: &str) -> &'static str {
    FACTORS
        .iter()
        .find(|f| f.key == key)
        .map(|f| f.definition)
        .unwrap_or("Additional wear factor observed in ride history.")
}

/// Attributes accumulated wear to factors as percentages summing to ~100.
///
/// Zero total raw magnitude short-circuits to an empty list. The result
/// is capped to `config.max_drivers` entries, descending by contribution,
/// ties broken by canonical factor order.
pub fn attribute(acc: &WearAccumulation, config: &EngineConfig) -> Vec<WearDriver> {
    let mut raw: Vec<(usize, f64)> = Vec::new();

    for (index, factor) in FACTORS.iter().enumerate() {
        let magnitude: f64 = acc
            .rides
            .iter()
            .map(|ride| raw_magnitude(factor.key, ride))
            .sum();
        let weighted = magnitude * config.weight(factor.key);
        if weighted > 0.0 {
            raw.push((index, weighted));
        }
    }

    let total: f64 = raw.iter().map(|(_, magnitude)| magnitude).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut drivers: Vec<(usize, WearDriver)> = raw
        .into_iter()
        .map(|(index, magnitude)| {
            let factor = &FACTORS[index];
            let contribution = (magnitude / total * 1000.0).round() / 10.0;
            (
                index,
                WearDriver {
                    factor: factor.key.to_string(),
                    label: factor.label.to_string(),
                    contribution,
                },
            )
        })
        .collect();

    drivers.sort_by(|(index_a, a), (index_b, b)| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(Ordering::Equal)
            .then(index_a.cmp(index_b))
    });
    drivers.truncate(config.max_drivers);
    drivers.into_iter().map(|(_, driver)| driver).collect()
}

/// Raw per-ride wear magnitude for one factor. Units cancel out in
/// normalization; only relative scale matters.
fn raw_magnitude(factor: &str, ride: &RideWear) -> f64 {
    match factor {
        "steepness" => ride.grade_percent * ride.hours,
        "hours" => ride.hours,
        "climbing" => ride.elevation_gain_feet / 1000.0,
        "distance" => ride.distance_miles / 10.0,
        "speed" => (ride.avg_speed_mph - 10.0).max(0.0) / 10.0 * ride.hours,
        "temperature" => ride
            .temperature_f
            .map(|t| (t - 60.0).abs() / 20.0 * ride.hours)
            .unwrap_or(0.0),
        "conditions" => ride.condition_severity * ride.hours,
        _ => 0.0,
    }
}
