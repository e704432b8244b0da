//! Versioned access to persisted component baselines.
//!
//! The engine never caches predictions, so the store is the only shared
//! mutable state. Every mutation is a compare-and-swap on the baseline's
//! version stamp; readers see either the pre- or post-mutation record,
//! never a torn one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use thiserror::Error;
use tracing::debug;

use crate::model::{Bike, ComponentBaseline};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown component: {0}")]
    NotFound(String),
    #[error("baseline for {component_id} changed concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        component_id: String,
        expected: u64,
        found: u64,
    },
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Read/compare-and-swap access to component baselines.
pub trait BaselineStore: Send + Sync {
    /// Current baseline for a component.
    fn get(&self, component_id: &str) -> Result<ComponentBaseline, StoreError>;

    /// Replaces a baseline if its stored version still matches
    /// `expected_version`. The store bumps the version stamp and returns
    /// the committed record.
    fn update(
        &self,
        expected_version: u64,
        updated: ComponentBaseline,
    ) -> Result<ComponentBaseline, StoreError>;
}

/// In-memory store for embedding and tests.
pub struct MemoryStore {
    inner: Mutex<HashMap<String, ComponentBaseline>>,
}

impl MemoryStore {
    pub fn new(baselines: impl IntoIterator<Item = ComponentBaseline>) -> Self {
        let inner = baselines
            .into_iter()
            .map(|b| (b.component_id.clone(), b))
            .collect();
        Self {
            inner: Mutex::new(inner),
        }
    }
}

impl BaselineStore for MemoryStore {
    fn get(&self, component_id: &str) -> Result<ComponentBaseline, StoreError> {
        let inner = self.inner.lock().expect("baseline store lock poisoned");
        inner
            .get(component_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(component_id.to_string()))
    }

    fn update(
        &self,
        expected_version: u64,
        updated: ComponentBaseline,
    ) -> Result<ComponentBaseline, StoreError> {
        let mut inner = self.inner.lock().expect("baseline store lock poisoned");
        let current = inner
            .get(&updated.component_id)
            .ok_or_else(|| StoreError::NotFound(updated.component_id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                component_id: updated.component_id.clone(),
                expected: expected_version,
                found: current.version,
            });
        }

        let mut committed = updated;
        committed.version = expected_version + 1;
        inner.insert(committed.component_id.clone(), committed.clone());
        Ok(committed)
    }
}

/// File-backed store over a fleet JSON document (an array of bikes).
/// Whole-file read-modify-write under a process-local lock.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<Bike>, StoreError> {
        Ok(load_fleet(&self.path)?)
    }

    fn save(&self, fleet: &[Bike]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(fleet)
            .context("failed to serialize fleet")
            .map_err(StoreError::Io)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write fleet file {}", self.path.display()))
            .map_err(StoreError::Io)?;
        Ok(())
    }
}

impl BaselineStore for JsonFileStore {
    fn get(&self, component_id: &str) -> Result<ComponentBaseline, StoreError> {
        let _guard = self.lock.lock().expect("fleet file lock poisoned");
        let fleet = self.load()?;
        find_component(&fleet, component_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(component_id.to_string()))
    }

    fn update(
        &self,
        expected_version: u64,
        updated: ComponentBaseline,
    ) -> Result<ComponentBaseline, StoreError> {
        let _guard = self.lock.lock().expect("fleet file lock poisoned");
        let mut fleet = self.load()?;

        let slot = fleet
            .iter_mut()
            .flat_map(|bike| bike.components.iter_mut())
            .find(|c| c.component_id == updated.component_id)
            .ok_or_else(|| StoreError::NotFound(updated.component_id.clone()))?;

        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                component_id: updated.component_id.clone(),
                expected: expected_version,
                found: slot.version,
            });
        }

        let mut committed = updated;
        committed.version = expected_version + 1;
        *slot = committed.clone();

        self.save(&fleet)?;
        debug!(component_id = %committed.component_id, version = committed.version, "Baseline committed");
        Ok(committed)
    }
}

/// Loads a fleet document (an array of bikes) from a JSON file.
pub fn load_fleet(path: &Path) -> anyhow::Result<Vec<Bike>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fleet file {}", path.display()))?;
    let fleet: Vec<Bike> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse fleet file {}", path.display()))?;
    Ok(fleet)
}

/// Finds a component baseline anywhere in a fleet.
pub fn find_component<'a>(fleet: &'a [Bike], component_id: &str) -> Option<&'a ComponentBaseline> {
    fleet
        .iter()
        .flat_map(|bike| bike.components.iter())
        .find(|c| c.component_id == component_id)
}

/// Finds the bike owning a component.
pub fn find_bike<'a>(fleet: &'a [Bike], component_id: &str) -> Option<&'a Bike> {
    fleet
        .iter()
        .find(|bike| bike.components.iter().any(|c| c.component_id == component_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaselineMethod, ComponentType, Location};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_memory_store_get_unknown_component() {
        let store = MemoryStore::new([]);
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_store_update_bumps_version() {
        let store = MemoryStore::new([baseline("c1")]);
        let mut b = store.get("c1").unwrap();
        b.snoozed_hours = 10.0;

        let committed = store.update(0, b).unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(store.get("c1").unwrap().snoozed_hours, 10.0);
    }

    #[test]
    fn test_memory_store_rejects_stale_version() {
        let store = MemoryStore::new([baseline("c1")]);
        let b = store.get("c1").unwrap();
        store.update(0, b.clone()).unwrap();

        // A second writer holding the pre-update record must not clobber.
        let result = store.update(0, b);
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let path = std::env::temp_dir().join("bike_wear_rater_store_test.json");
        let fleet = vec![Bike {
            id: "b1".to_string(),
            display_name: "Enduro".to_string(),
            components: vec![baseline("c1")],
        }];
        std::fs::write(&path, serde_json::to_string(&fleet).unwrap()).unwrap();

        let store = JsonFileStore::new(&path);
        let mut b = store.get("c1").unwrap();
        b.snoozed_hours = 25.0;
        let committed = store.update(0, b).unwrap();
        assert_eq!(committed.version, 1);

        // Fresh store instance sees the committed record.
        let reloaded = JsonFileStore::new(&path).get("c1").unwrap();
        assert_eq!(reloaded.snoozed_hours, 25.0);
        assert_eq!(reloaded.version, 1);

        std::fs::remove_file(&path).unwrap();
    }

    // Helper functions for tests
    fn baseline(id: &str) -> ComponentBaseline {
        ComponentBaseline {
            component_id: id.to_string(),
            component_type: ComponentType::Chain,
            location: Location::None,
            brand: None,
            model: None,
            is_stock: false,
            service_interval_hours: 30.0,
            installed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            last_serviced_at: None,
            baseline_wear_percent: None,
            baseline_method: BaselineMethod::Manual,
            baseline_confidence: None,
            snoozed_hours: 0.0,
            version: 0,
        }
    }
}
