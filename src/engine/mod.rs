//! Component wear prediction and fleet prioritization.
//!
//! This module folds ride history into accumulated wear per component,
//! attributes that wear to causal factors, classifies urgency, and ranks
//! components and bikes by the shared urgency comparator.

pub mod accumulate;
pub mod confidence;
pub mod drivers;
pub mod predict;
pub mod priority;
pub mod status;
