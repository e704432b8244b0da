//! Engine tuning parameters.
//!
//! Status cutoffs, factor weights, and confidence minimums are product
//! configuration, not code. The shipped defaults apply when no config file
//! is present; a JSON file (path via `WEAR_CONFIG_PATH`) overrides them.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hours remaining at or below which a component is DUE_NOW.
    pub due_now_hours: f64,
    /// Hours remaining at or below which a component is DUE_SOON.
    pub due_soon_hours: f64,
    /// Per-factor weight overrides applied to raw wear magnitudes.
    /// Factors absent from the map weigh 1.0.
    pub factor_weights: HashMap<String, f64>,
    /// Maximum number of wear drivers reported per component.
    pub max_drivers: usize,
    /// Upper bound accepted by `snooze_component`.
    pub max_snooze_hours: f64,
    /// Minimum rides in the accumulation window for HIGH confidence.
    pub min_rides_high: usize,
    /// Minimum rides for MEDIUM confidence on an inferred baseline.
    pub min_rides_medium: usize,
    /// Minimum span of ride history (days) for HIGH confidence on an
    /// inferred baseline.
    pub min_span_days_high: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut factor_weights = HashMap::new();
        factor_weights.insert("steepness".to_string(), 1.5);
        factor_weights.insert("conditions".to_string(), 1.25);

        Self {
            due_now_hours: 5.0,
            due_soon_hours: 15.0,
            factor_weights,
            max_drivers: 4,
            max_snooze_hours: 400.0,
            min_rides_high: 8,
            min_rides_medium: 3,
            min_span_days_high: 21,
        }
    }
}

impl EngineConfig {
    /// Loads config from a JSON file at `path`. Missing fields fall back
    /// to the shipped defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config at {path}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config at {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves config from the `WEAR_CONFIG_PATH` env var. An unset var
    /// yields the defaults; a set-but-unreadable path is an error.
    pub fn load_from_env() -> Result<Self> {
        match std::env::var("WEAR_CONFIG_PATH") {
            Ok(path) => {
                debug!(path, "Loading engine config");
                Self::load(&path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Weight for a factor key; unknown factors weigh 1.0.
    pub fn weight(&self, factor: &str) -> f64 {
        self.factor_weights.get(factor).copied().unwrap_or(1.0)
    }

    fn validate(&self) -> Result<()> {
        if !self.due_now_hours.is_finite() || self.due_now_hours <= 0.0 {
            bail!("due_now_hours must be a positive number");
        }
        if !self.due_soon_hours.is_finite() || self.due_soon_hours <= self.due_now_hours {
            bail!("due_soon_hours must exceed due_now_hours");
        }
        if !self.max_snooze_hours.is_finite() || self.max_snooze_hours <= 0.0 {
            bail!("max_snooze_hours must be a positive number");
        }
        if self.max_drivers == 0 {
            bail!("max_drivers must be at least 1");
        }
        if self.min_rides_high < self.min_rides_medium {
            bail!("min_rides_high must be >= min_rides_medium");
        }
        for (factor, weight) in &self.factor_weights {
            if !weight.is_finite() || *weight < 0.0 {
                bail!("weight for factor {factor} must be a non-negative number");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_unknown_factor_weighs_one() {
        let config = EngineConfig::default();
        assert_eq!(config.weight("barometric_pressure"), 1.0);
        assert_eq!(config.weight("steepness"), 1.5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"due_now_hours": 8.0}"#).unwrap();
        assert_eq!(config.due_now_hours, 8.0);
        assert_eq!(config.due_soon_hours, 15.0);
        assert_eq!(config.max_drivers, 4);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"due_now_hours": 20.0, "due_soon_hours": 15.0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"factor_weights": {"speed": -1.0}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
