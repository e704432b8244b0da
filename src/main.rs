//! CLI entry point for the bike wear rater.
//!
//! Provides subcommands for predicting a single bike's component wear,
//! ranking a whole fleet, and applying service-log and snooze mutations
//! against a fleet file.

use anyhow::{Context, Result, anyhow};
use bike_wear_rater::config::EngineConfig;
use bike_wear_rater::engine::predict::compute_predictions;
use bike_wear_rater::engine::priority::{component_label, priority_bike, rank_bikes};
use bike_wear_rater::engine::status::display_hours;
use bike_wear_rater::ledger::{load_bike, load_rides};
use bike_wear_rater::model::{Bike, BikePredictionSummary, RideRecord};
use bike_wear_rater::output::{append_records, print_json, print_pretty};
use bike_wear_rater::service;
use bike_wear_rater::store::{self, JsonFileStore};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bike_wear_rater")]
#[command(about = "Predicts bicycle component wear and ranks what to service next", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute wear predictions for a single bike
    Predict {
        /// Path or URL of the bike JSON (with component baselines)
        #[arg(short, long)]
        bike: String,

        /// Path or URL of the ride ledger JSON
        #[arg(short, long)]
        rides: String,

        /// CSV file to append prediction rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Print the summary as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rank every bike in a fleet file and pick the priority bike
    Fleet {
        /// Path to the fleet JSON file (an array of bikes)
        #[arg(short, long)]
        fleet_file: String,

        /// Path or URL of the ride ledger JSON covering the fleet
        #[arg(short, long)]
        rides: String,

        /// Print all summaries as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Record that a component was serviced on a given date
    LogService {
        /// Path to the fleet JSON file acting as the baseline store
        #[arg(short, long)]
        fleet_file: String,

        /// Component to mark as serviced
        #[arg(short, long)]
        component: String,

        /// Service date, RFC 3339 or YYYY-MM-DD
        #[arg(short, long)]
        performed_at: String,

        /// Optional ride ledger; recomputes the affected bike afterwards
        #[arg(short, long)]
        rides: Option<String>,
    },
    /// Extend a component's service interval without logging a service
    Snooze {
        /// Path to the fleet JSON file acting as the baseline store
        #[arg(short, long)]
        fleet_file: String,

        /// Component to snooze
        #[arg(short, long)]
        component: String,

        /// Extra hours to add to the effective interval
        #[arg(long)]
        hours: f64,

        /// Optional ride ledger; recomputes the affected bike afterwards
        #[arg(short, long)]
        rides: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bike_wear_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bike_wear_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = EngineConfig::load_from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            bike,
            rides,
            output,
            json,
        } => {
            let bike = load_bike(&bike).await?;
            let rides = load_rides(&rides).await?;

            let summary = compute_predictions(&bike, &rides, &config);
            log_summary(&summary);
            print_pretty(&summary);

            if let Some(path) = output {
                append_records(&path, &summary)?;
            }
            if json {
                print_json(&summary)?;
            }
        }
        Commands::Fleet {
            fleet_file,
            rides,
            json,
        } => {
            let fleet = store::load_fleet(Path::new(&fleet_file))?;
            let rides = load_rides(&rides).await?;

            let mut summaries: Vec<BikePredictionSummary> = fleet
                .iter()
                .map(|bike| compute_predictions(bike, &rides, &config))
                .collect();
            rank_bikes(&mut summaries);

            for summary in &summaries {
                log_summary(summary);
            }

            match priority_bike(&summaries) {
                Some(priority) => {
                    let component = priority
                        .priority_component
                        .as_ref()
                        .map(component_label)
                        .unwrap_or_default();
                    info!(
                        bike = %priority.bike_name,
                        component = %component,
                        "Fleet priority"
                    );
                }
                None => info!("Fleet priority: everything is in good shape"),
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            }
        }
        Commands::LogService {
            fleet_file,
            component,
            performed_at,
            rides,
        } => {
            let performed_at = parse_timestamp(&performed_at)?;
            let fleet_store = JsonFileStore::new(&fleet_file);

            let committed = service::log_service(&fleet_store, &component, performed_at)?;
            info!(
                component_id = %committed.component_id,
                performed_at = %performed_at,
                "Service recorded"
            );

            recompute_affected(&fleet_file, &component, rides, &config).await?;
        }
        Commands::Snooze {
            fleet_file,
            component,
            hours,
            rides,
        } => {
            let fleet_store = JsonFileStore::new(&fleet_file);

            let committed = service::snooze_component(&fleet_store, &component, hours, &config)?;
            info!(
                component_id = %committed.component_id,
                snoozed_hours = committed.snoozed_hours,
                "Snooze recorded"
            );

            recompute_affected(&fleet_file, &component, rides, &config).await?;
        }
    }

    Ok(())
}

/// Logs one line per component, most urgent first.
fn log_summary(summary: &BikePredictionSummary) {
    info!(
        bike = %summary.bike_name,
        overall = ?summary.overall_status,
        due_now = summary.due_now_count,
        due_soon = summary.due_soon_count,
        "Bike summary"
    );
    for prediction in &summary.components {
        info!(
            component = %component_label(prediction),
            status = ?prediction.status,
            hours_left = display_hours(prediction.hours_remaining),
            confidence = ?prediction.confidence,
            why = prediction.why.as_deref().unwrap_or("-"),
            "Component"
        );
    }
}

/// Recomputes and logs the summary of the bike owning `component_id`,
/// when a ride ledger was supplied.
async fn recompute_affected(
    fleet_file: &str,
    component_id: &str,
    rides: Option<String>,
    config: &EngineConfig,
) -> Result<()> {
    let Some(rides_source) = rides else {
        return Ok(());
    };

    let fleet = store::load_fleet(Path::new(fleet_file))?;
    let bike: &Bike = store::find_bike(&fleet, component_id)
        .ok_or_else(|| anyhow!("component {component_id} not found in fleet file"))?;
    let rides: Vec<RideRecord> = load_rides(&rides_source).await?;

    let summary = compute_predictions(bike, &rides, config);
    log_summary(&summary);
    Ok(())
}

/// Accepts either an RFC 3339 timestamp or a plain date (midnight UTC).
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid timestamp: {value}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid timestamp: {value}"))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc))
}
