//! Service-event application: the only writer of component baselines.
//!
//! Both operations validate first, then retry a bounded compare-and-swap
//! against the store. A rejected call mutates nothing.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::model::ComponentBaseline;
use crate::store::{BaselineStore, StoreError};

/// How many times a mutation retries after losing a version race.
const MAX_UPDATE_RETRIES: usize = 3;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown component: {0}")]
    UnknownComponent(String),
    #[error("service date {performed_at} is in the future")]
    FutureServiceDate { performed_at: DateTime<Utc> },
    #[error("snooze of {requested} h is outside the allowed range (0, {max}]")]
    SnoozeOutOfRange { requested: f64, max: f64 },
    #[error("baseline for {0} kept changing concurrently; giving up")]
    Contention(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::UnknownComponent(id),
            other => ServiceError::Store(other),
        }
    }
}

/// Records that a component was serviced on `performed_at`.
///
/// Rejects future dates. Resets the accumulation reference point so only
/// rides on/after `performed_at` count toward the next prediction, and
/// clears any snooze (the component returns to its normal state). The
/// caller recomputes predictions afterwards.
pub fn log_service(
    store: &dyn BaselineStore,
    component_id: &str,
    performed_at: DateTime<Utc>,
) -> Result<ComponentBaseline, ServiceError> {
    if performed_at > Utc::now() {
        return Err(ServiceError::FutureServiceDate { performed_at });
    }

    let committed = apply(store, component_id, |baseline| {
        baseline.last_serviced_at = Some(performed_at);
        baseline.snoozed_hours = 0.0;
    })?;

    info!(
        component_id,
        performed_at = %performed_at,
        version = committed.version,
        "Service logged"
    );
    Ok(committed)
}

/// Extends a component's effective service interval without recording a
/// service event, leaving `last_serviced_at` and the wear-driver history
/// untouched.
pub fn snooze_component(
    store: &dyn BaselineStore,
    component_id: &str,
    extra_hours: f64,
    config: &EngineConfig,
) -> Result<ComponentBaseline, ServiceError> {
    if !extra_hours.is_finite() || extra_hours <= 0.0 || extra_hours > config.max_snooze_hours {
        return Err(ServiceError::SnoozeOutOfRange {
            requested: extra_hours,
            max: config.max_snooze_hours,
        });
    }

    let committed = apply(store, component_id, |baseline| {
        baseline.snoozed_hours += extra_hours;
    })?;

    info!(
        component_id,
        extra_hours,
        snoozed_hours = committed.snoozed_hours,
        "Component snoozed"
    );
    Ok(committed)
}

/// Bounded read-modify-write loop against the store's version stamp.
fn apply(
    store: &dyn BaselineStore,
    component_id: &str,
    mutate: impl Fn(&mut ComponentBaseline),
) -> Result<ComponentBaseline, ServiceError> {
    for attempt in 0..MAX_UPDATE_RETRIES {
        let mut baseline = store.get(component_id)?;
        let expected_version = baseline.version;
        mutate(&mut baseline);

        match store.update(expected_version, baseline) {
            Ok(committed) => return Ok(committed),
            Err(StoreError::VersionConflict { .. }) => {
                warn!(component_id, attempt, "Version conflict, retrying");
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
    Err(ServiceError::Contention(component_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::predict::compute_predictions;
    use crate::model::{BaselineMethod, Bike, ComponentType, Location, RideRecord};
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_log_service_rejects_future_dates() {
        let store = MemoryStore::new([baseline("c1")]);
        let future = Utc::now() + chrono::Duration::days(7);

        let result = log_service(&store, "c1", future);
        assert!(matches!(
            result,
            Err(ServiceError::FutureServiceDate { .. })
        ));
        // No partial mutation.
        assert!(store.get("c1").unwrap().last_serviced_at.is_none());
    }

    #[test]
    fn test_log_service_rejects_unknown_component() {
        let store = MemoryStore::new([]);
        let result = log_service(&store, "ghost", utc(2024, 1, 15));
        assert!(matches!(result, Err(ServiceError::UnknownComponent(_))));
    }

    #[test]
    fn test_log_service_is_retroactive() {
        let store = MemoryStore::new([baseline("c1")]);
        let rides = vec![
            ride("r1", utc(2024, 1, 5), 2.0),
            ride("r2", utc(2024, 1, 10), 3.0),
            ride("r3", utc(2024, 1, 20), 4.0),
        ];

        let committed = log_service(&store, "c1", utc(2024, 1, 15)).unwrap();
        let bike = Bike {
            id: "b1".to_string(),
            display_name: "Enduro".to_string(),
            components: vec![committed],
        };

        let summary = compute_predictions(&bike, &rides, &EngineConfig::default());
        // Only the Jan 20 ride counts after servicing on Jan 15.
        assert_eq!(summary.components[0].hours_since_service, 4.0);
    }

    #[test]
    fn test_snooze_extends_interval_without_touching_service_date() {
        let mut b = baseline("c1");
        b.last_serviced_at = Some(utc(2024, 1, 1));
        let store = MemoryStore::new([b]);
        let config = EngineConfig::default();
        let rides = vec![ride("r1", utc(2024, 1, 10), 6.0)];

        let before = predict(&store, &rides, &config);
        let committed = snooze_component(&store, "c1", 50.0, &config).unwrap();
        let after = predict(&store, &rides, &config);

        assert_eq!(committed.last_serviced_at, Some(utc(2024, 1, 1)));
        assert_eq!(committed.snoozed_hours, 50.0);
        assert_eq!(after.hours_remaining, before.hours_remaining + 50.0);
        // Wear-driver history survives the snooze.
        assert_eq!(after.drivers, before.drivers);
    }

    #[test]
    fn test_snooze_rejects_out_of_range_values() {
        let store = MemoryStore::new([baseline("c1")]);
        let config = EngineConfig::default();

        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY, 401.0] {
            let result = snooze_component(&store, "c1", bad, &config);
            assert!(
                matches!(result, Err(ServiceError::SnoozeOutOfRange { .. })),
                "{bad} should be rejected"
            );
        }
        assert_eq!(store.get("c1").unwrap().snoozed_hours, 0.0);
    }

    #[test]
    fn test_snoozes_stack() {
        let store = MemoryStore::new([baseline("c1")]);
        let config = EngineConfig::default();

        snooze_component(&store, "c1", 20.0, &config).unwrap();
        let committed = snooze_component(&store, "c1", 30.0, &config).unwrap();
        assert_eq!(committed.snoozed_hours, 50.0);
        assert_eq!(committed.version, 2);
    }

    #[test]
    fn test_service_clears_snooze() {
        let store = MemoryStore::new([baseline("c1")]);
        let config = EngineConfig::default();

        snooze_component(&store, "c1", 40.0, &config).unwrap();
        let committed = log_service(&store, "c1", utc(2024, 2, 1)).unwrap();
        assert_eq!(committed.snoozed_hours, 0.0);
        assert_eq!(committed.last_serviced_at, Some(utc(2024, 2, 1)));
    }

    // Helper functions for tests
    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn baseline(id: &str) -> ComponentBaseline {
        ComponentBaseline {
            component_id: id.to_string(),
            component_type: ComponentType::Chain,
            location: Location::None,
            brand: None,
            model: None,
            is_stock: false,
            service_interval_hours: 30.0,
            installed_at: utc(2024, 1, 1),
            last_serviced_at: None,
            baseline_wear_percent: None,
            baseline_method: BaselineMethod::Manual,
            baseline_confidence: None,
            snoozed_hours: 0.0,
            version: 0,
        }
    }

    fn ride(id: &str, start: DateTime<Utc>, hours: f64) -> RideRecord {
        RideRecord {
            id: id.to_string(),
            bike_id: "b1".to_string(),
            start_time: Some(start),
            duration_seconds: hours * 3600.0,
            distance_miles: hours * 10.0,
            elevation_gain_feet: 900.0,
            avg_speed_mph: Some(10.0),
            temperature_f: None,
            conditions: Some("dry".to_string()),
        }
    }

    fn predict(
        store: &MemoryStore,
        rides: &[RideRecord],
        config: &EngineConfig,
    ) -> crate::model::ComponentPrediction {
        let bike = Bike {
            id: "b1".to_string(),
            display_name: "Enduro".to_string(),
            components: vec![store.get("c1").unwrap()],
        };
        compute_predictions(&bike, rides, config)
            .components
            .into_iter()
            .next()
            .unwrap()
    }
}
