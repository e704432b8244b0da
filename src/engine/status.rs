//! Urgency classification from hours remaining.

use crate::config::EngineConfig;
use crate::model::Status;

/// Maps hours remaining to an urgency status.
///
/// | Range                        | Status   |
/// |------------------------------|----------|
/// | <= 0 (including -0)          | OVERDUE  |
/// | (0, due_now_hours]           | DUE_NOW  |
/// | (due_now, due_soon_hours]    | DUE_SOON |
/// | > due_soon_hours (or NaN)    | ALL_GOOD |
///
/// Monotonic: the status never improves as hours remaining decreases.
/// NaN means the interval was unusable and no urgency can be claimed.
pub fn classify(hours_remaining: f64, config: &EngineConfig) -> Status {
    match hours_remaining {
        h if h <= 0.0 => Status::Overdue,
        h if h <= config.due_now_hours => Status::DueNow,
        h if h <= config.due_soon_hours => Status::DueSoon,
        _ => Status::AllGood,
    }
}

/// Clamps hours remaining for display. Overdue components render as 0.0
/// hours left; the signed value stays available on the prediction.
pub fn display_hours(hours_remaining: f64) -> f64 {
    if hours_remaining.is_finite() {
        hours_remaining.max(0.0)
    } else {
        0.0
    }
}
