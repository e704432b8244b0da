//! Output formatting and persistence for prediction summaries.
//!
//! Supports pretty-printing, JSON serialization, and CSV append of
//! flattened per-component prediction rows.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::priority::component_label;
use crate::engine::status::display_hours;
use crate::model::{BikePredictionSummary, Confidence, Status};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a prediction summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &BikePredictionSummary) {
    debug!("{:#?}", summary);
}

/// Prints a prediction summary as pretty-printed JSON on stdout.
pub fn print_json(summary: &BikePredictionSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// One flattened CSV row per component prediction.
#[derive(Serialize)]
struct PredictionRow<'a> {
    generated_at: DateTime<Utc>,
    bike_id: &'a str,
    component_id: &'a str,
    component: String,
    status: Status,
    hours_remaining: f64,
    hours_remaining_display: f64,
    hours_since_service: f64,
    service_interval_hours: f64,
    rides_remaining_estimate: u32,
    confidence: Confidence,
}

/// Appends a summary's component predictions as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, summary: &BikePredictionSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for prediction in &summary.components {
        writer.serialize(PredictionRow {
            generated_at: summary.generated_at,
            bike_id: &summary.bike_id,
            component_id: &prediction.component_id,
            component: component_label(prediction),
            status: prediction.status,
            hours_remaining: prediction.hours_remaining,
            hours_remaining_display: display_hours(prediction.hours_remaining),
            hours_since_service: prediction.hours_since_service,
            service_interval_hours: prediction.service_interval_hours,
            rides_remaining_estimate: prediction.rides_remaining_estimate,
            confidence: prediction.confidence,
        })?;
    }
    writer.flush()?;

    info!(path, rows = summary.components.len(), "Predictions appended");
    Ok(())
}
