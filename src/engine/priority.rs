//! Urgency ordering for components and bikes.
//!
//! One comparator, applied at two scopes: ranking a bike's components and
//! ranking bikes across a fleet by their own priority component. The UI
//! never reimplements this ordering.

use std::cmp::Ordering;

use crate::model::{BikePredictionSummary, ComponentPrediction, Location, Status};

/// The single authoritative component label, also the comparator's final
/// tie-break key ("Front Brake Pad", "Chain", ...).
pub fn component_label(prediction: &ComponentPrediction) -> String {
    match prediction.location {
        Location::Front => format!("Front {}", prediction.component_type.label()),
        Location::Rear => format!("Rear {}", prediction.component_type.label()),
        Location::None => prediction.component_type.label().to_string(),
    }
}

/// The three-key urgency comparator: status severity descending, hours
/// remaining ascending (NaN last), label ascending.
pub fn compare_urgency(
    status_a: Status,
    hours_a: f64,
    label_a: &str,
    status_b: Status,
    hours_b: f64,
    label_b: &str,
) -> Ordering {
    status_b
        .cmp(&status_a)
        .then_with(|| compare_hours(hours_a, hours_b))
        .then_with(|| label_a.cmp(label_b))
}

fn compare_hours(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Sorts a bike's predictions most urgent first.
pub fn rank_components(predictions: &mut [ComponentPrediction]) {
    predictions.sort_by(|a, b| {
        compare_urgency(
            a.status,
            a.hours_remaining,
            &component_label(a),
            b.status,
            b.hours_remaining,
            &component_label(b),
        )
    });
}

/// The most urgent component of an already-ranked list, or `None` when
/// everything is ALL_GOOD.
pub fn pick_priority(ranked: &[ComponentPrediction]) -> Option<ComponentPrediction> {
    ranked
        .first()
        .filter(|p| p.status > Status::AllGood)
        .cloned()
}

/// Maximum severity across a bike's components; ALL_GOOD when empty.
pub fn overall_status(predictions: &[ComponentPrediction]) -> Status {
    predictions
        .iter()
        .map(|p| p.status)
        .max()
        .unwrap_or(Status::AllGood)
}

/// Orders two bikes by their priority components using the same
/// comparator, with the bike display name as the label tie-break. Bikes
/// with nothing due sort last, alphabetically.
pub fn compare_bikes(a: &BikePredictionSummary, b: &BikePredictionSummary) -> Ordering {
    match (&a.priority_component, &b.priority_component) {
        (Some(pa), Some(pb)) => compare_urgency(
            pa.status,
            pa.hours_remaining,
            &a.bike_name,
            pb.status,
            pb.hours_remaining,
            &b.bike_name,
        ),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.bike_name.cmp(&b.bike_name),
    }
}

/// Sorts fleet summaries most urgent first.
pub fn rank_bikes(summaries: &mut [BikePredictionSummary]) {
    summaries.sort_by(compare_bikes);
}

/// The fleet's single priority bike: the one whose priority component
/// sorts first. `None` when every bike is ALL_GOOD.
pub fn priority_bike(summaries: &[BikePredictionSummary]) -> Option<&BikePredictionSummary> {
    summaries
        .iter()
        .filter(|s| s.priority_component.is_some())
        .min_by(|a, b| compare_bikes(a, b))
}
