//! Per-bike prediction orchestration.
//!
//! Pure with respect to its inputs: the same baselines and ledger always
//! produce the same numbers. Only `generated_at` is stamped at call time.

use chrono::Utc;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::accumulate::{WearAccumulation, accumulate};
use crate::engine::confidence::estimate;
use crate::engine::drivers::attribute;
use crate::engine::priority::{overall_status, pick_priority, rank_components};
use crate::engine::status::{classify, display_hours};
use crate::model::{
    Bike, BikePredictionSummary, ComponentBaseline, ComponentPrediction, RideRecord, Status,
    WearDriver,
};

/// Computes a fresh prediction summary for one bike.
///
/// Rides belonging to other bikes are ignored. Degenerate inputs (no
/// rides, unusable interval) yield ALL_GOOD/LOW predictions with `why`
/// and `drivers` absent rather than an error.
pub fn compute_predictions(
    bike: &Bike,
    rides: &[RideRecord],
    config: &EngineConfig,
) -> BikePredictionSummary {
    let bike_rides: Vec<RideRecord> = rides
        .iter()
        .filter(|r| r.bike_id == bike.id)
        .cloned()
        .collect();
    let span_days = ledger_span_days(&bike_rides);

    let mut components: Vec<ComponentPrediction> = bike
        .components
        .iter()
        .map(|baseline| predict_component(baseline, &bike_rides, span_days, config))
        .collect();

    rank_components(&mut components);
    let priority_component = pick_priority(&components);
    let overall = overall_status(&components);

    let due_now_count = components
        .iter()
        .filter(|p| p.status >= Status::DueNow)
        .count();
    let due_soon_count = components
        .iter()
        .filter(|p| p.status == Status::DueSoon)
        .count();

    debug!(
        bike_id = %bike.id,
        components = components.len(),
        overall = ?overall,
        due_now_count,
        "Predictions computed"
    );

    BikePredictionSummary {
        bike_id: bike.id.clone(),
        bike_name: bike.display_name.clone(),
        components,
        priority_component,
        overall_status: overall,
        due_now_count,
        due_soon_count,
        generated_at: Utc::now(),
    }
}

fn predict_component(
    baseline: &ComponentBaseline,
    rides: &[RideRecord],
    span_days: i64,
    config: &EngineConfig,
) -> ComponentPrediction {
    let acc = accumulate(baseline, rides);

    let interval = baseline.effective_interval_hours();
    let interval_usable = interval.is_finite() && interval > 0.0;
    let hours_remaining = if interval_usable {
        interval - acc.hours_since_service
    } else {
        f64::NAN
    };

    let status = classify(hours_remaining, config);
    let driver_list = attribute(&acc, config);
    let confidence = estimate(
        baseline.baseline_method,
        baseline.baseline_confidence,
        acc.rides.len(),
        span_days,
        config,
    );
    let why = build_why(status, hours_remaining, &driver_list);

    ComponentPrediction {
        component_id: baseline.component_id.clone(),
        component_type: baseline.component_type,
        location: baseline.location,
        brand: baseline.brand.clone(),
        model: baseline.model.clone(),
        status,
        hours_remaining,
        rides_remaining_estimate: rides_remaining(hours_remaining, &acc),
        confidence,
        current_hours: acc.lifetime_hours,
        service_interval_hours: interval,
        hours_since_service: acc.hours_since_service,
        why,
        drivers: if driver_list.is_empty() {
            None
        } else {
            Some(driver_list)
        },
    }
}

/// Days between the first and last datable ride in the ledger.
fn ledger_span_days(rides: &[RideRecord]) -> i64 {
    let mut times = rides.iter().filter_map(|r| r.start_time);
    let Some(first) = times.next() else { return 0 };
    let (min, max) = times.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
    (max - min).num_days()
}

/// How many more rides of typical length fit in the remaining hours.
fn rides_remaining(hours_remaining: f64, acc: &WearAccumulation) -> u32 {
    if !hours_remaining.is_finite() || hours_remaining <= 0.0 || acc.rides.is_empty() {
        return 0;
    }
    let mean_hours: f64 =
        acc.rides.iter().map(|r| r.hours).sum::<f64>() / acc.rides.len() as f64;
    if mean_hours <= 0.0 {
        return 0;
    }
    (hours_remaining / mean_hours).floor() as u32
}

fn build_why(status: Status, hours_remaining: f64, drivers: &[WearDriver]) -> Option<String> {
    let top = drivers.first()?;
    if !hours_remaining.is_finite() {
        return None;
    }
    match status {
        Status::Overdue => Some(format!(
            "Overdue by {:.1} h; {} accounts for {:.0}% of accumulated wear",
            -hours_remaining,
            top.label.to_lowercase(),
            top.contribution
        )),
        Status::DueNow => Some(format!(
            "About {:.1} h left; {} accounts for {:.0}% of accumulated wear",
            display_hours(hours_remaining),
            top.label.to_lowercase(),
            top.contribution
        )),
        Status::DueSoon => Some(format!(
            "{} accounts for {:.0}% of accumulated wear",
            top.label, top.contribution
        )),
        Status::AllGood => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaselineMethod, ComponentType, Confidence, Location};
    use chrono::{DateTime, TimeZone};

    #[test]
    fn test_hours_remaining_invariant_holds() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 30.0, None)]);
        let rides = ride_block(6, 4.0); // 24 h

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        let p = &summary.components[0];
        assert_eq!(
            p.hours_remaining,
            p.service_interval_hours - p.hours_since_service
        );
        assert_eq!(p.hours_remaining, 6.0);
    }

    #[test]
    fn test_overdue_component_surfaces_first() {
        let bike = bike(vec![
            component("fork", ComponentType::Fork, 100.0, None),
            component("chain", ComponentType::Chain, 20.0, None),
        ]);
        let rides = ride_block(6, 4.0); // 24 h -> chain overdue by 4

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        assert_eq!(summary.overall_status, Status::Overdue);
        assert_eq!(summary.components[0].component_id, "chain");
        assert_eq!(
            summary.priority_component.as_ref().unwrap().component_id,
            "chain"
        );
        assert_eq!(summary.due_now_count, 1);
    }

    #[test]
    fn test_no_ride_history_short_circuits_safely() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 30.0, None)]);

        let summary = compute_predictions(&bike, &[], &EngineConfig::default());
        let p = &summary.components[0];
        assert_eq!(p.status, Status::AllGood);
        assert_eq!(p.confidence, Confidence::Low);
        assert!(p.why.is_none());
        assert!(p.drivers.is_none());
        assert_eq!(p.rides_remaining_estimate, 0);
        assert!(summary.priority_component.is_none());
    }

    #[test]
    fn test_unusable_interval_degrades_to_all_good() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 0.0, None)]);
        let rides = ride_block(4, 2.0);

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        let p = &summary.components[0];
        assert_eq!(p.status, Status::AllGood);
        assert!(p.hours_remaining.is_nan());
        assert!(p.why.is_none());
    }

    #[test]
    fn test_other_bikes_rides_are_ignored() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 30.0, None)]);
        let mut rides = ride_block(3, 4.0);
        let mut foreign = rides[0].clone();
        foreign.id = "foreign".to_string();
        foreign.bike_id = "someone-else".to_string();
        foreign.duration_seconds = 360000.0;
        rides.push(foreign);

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        assert_eq!(summary.components[0].hours_since_service, 12.0);
    }

    #[test]
    fn test_rides_remaining_uses_typical_ride_length() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 30.0, None)]);
        let rides = ride_block(5, 2.0); // 10 h ridden, 20 h left, 2 h rides

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        assert_eq!(summary.components[0].rides_remaining_estimate, 10);
    }

    #[test]
    fn test_why_names_the_dominant_driver() {
        let bike = bike(vec![component("chain", ComponentType::Chain, 20.0, None)]);
        let rides = ride_block(6, 4.0); // overdue

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        let p = &summary.components[0];
        let why = p.why.as_ref().unwrap();
        assert!(why.starts_with("Overdue by 4.0 h"));
        let top = &p.drivers.as_ref().unwrap()[0];
        assert!(why.to_lowercase().contains(&top.label.to_lowercase()));
    }

    // Helper functions for tests
    fn utc(y: i32, m: u32, d: u32) -> DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    fn component(
        id: &str,
        component_type: ComponentType,
        interval: f64,
        last_serviced_at: Option<DateTime<chrono::Utc>>,
    ) -> ComponentBaseline {
        ComponentBaseline {
            component_id: id.to_string(),
            component_type,
            location: Location::None,
            brand: None,
            model: None,
            is_stock: false,
            service_interval_hours: interval,
            installed_at: utc(2024, 1, 1),
            last_serviced_at,
            baseline_wear_percent: None,
            baseline_method: BaselineMethod::Manual,
            baseline_confidence: None,
            snoozed_hours: 0.0,
            version: 0,
        }
    }

    fn bike(components: Vec<ComponentBaseline>) -> Bike {
        Bike {
            id: "b1".to_string(),
            display_name: "Enduro".to_string(),
            components,
        }
    }

    fn ride_block(count: u32, hours_each: f64) -> Vec<RideRecord> {
        (0..count)
            .map(|i| RideRecord {
                id: format!("r{i}"),
                bike_id: "b1".to_string(),
                start_time: Some(utc(2024, 2, 1 + i)),
                duration_seconds: hours_each * 3600.0,
                distance_miles: hours_each * 9.0,
                elevation_gain_feet: 1200.0,
                avg_speed_mph: Some(9.0),
                temperature_f: None,
                conditions: None,
            })
            .collect()
    }
}
