//! Prediction confidence from data sufficiency and baseline provenance.

use crate::config::EngineConfig;
use crate::model::{BaselineMethod, Confidence};

/// Rates how trustworthy a prediction is.
///
/// A defaulted baseline caps confidence at LOW regardless of history. A
/// manual baseline with a real ride sample is HIGH; an inferred baseline
/// additionally needs its history to span enough days and its starting
/// wear estimate to be well supported. Total and deterministic; never
/// panics.
pub fn estimate(
    method: BaselineMethod,
    baseline_confidence: Option<Confidence>,
    ride_count: usize,
    data_span_days: i64,
    config: &EngineConfig,
) -> Confidence {
    match method {
        BaselineMethod::Default => Confidence::Low,
        BaselineMethod::Manual => {
            if ride_count >= config.min_rides_high {
                Confidence::High
            } else if ride_count >= config.min_rides_medium {
                Confidence::Medium
            } else {
                Confidence::Low
            }
        }
        BaselineMethod::Inferred => {
            let well_supported = baseline_confidence != Some(Confidence::Low);
            if well_supported
                && ride_count >= config.min_rides_high
                && data_span_days >= config.min_span_days_high
            {
                Confidence::High
            } else if ride_count >= config.min_rides_medium {
                Confidence::Medium
            } else {
                Confidence::Low
            }
        }
    }
}
