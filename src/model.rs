//! Data model shared with the surrounding CRUD layer.
//!
//! Baselines and rides come in as JSON; predictions go back out the same
//! way. Enums serialize as the SCREAMING_SNAKE_CASE strings the consuming
//! system uses (`DUE_NOW`, `PIVOT_BEARINGS`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A serviceable part tracked independently per bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Fork,
    Shock,
    Brakes,
    Drivetrain,
    Tires,
    Chain,
    Cassette,
    Chainring,
    Wheels,
    Dropper,
    PivotBearings,
    BrakePad,
    BrakeRotor,
    Headset,
    BottomBracket,
}

impl ComponentType {
    /// Display name used when formatting component labels.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::Fork => "Fork",
            ComponentType::Shock => "Shock",
            ComponentType::Brakes => "Brakes",
            ComponentType::Drivetrain => "Drivetrain",
            ComponentType::Tires => "Tires",
            ComponentType::Chain => "Chain",
            ComponentType::Cassette => "Cassette",
            ComponentType::Chainring => "Chainring",
            ComponentType::Wheels => "Wheels",
            ComponentType::Dropper => "Dropper Post",
            ComponentType::PivotBearings => "Pivot Bearings",
            ComponentType::BrakePad => "Brake Pad",
            ComponentType::BrakeRotor => "Brake Rotor",
            ComponentType::Headset => "Headset",
            ComponentType::BottomBracket => "Bottom Bracket",
        }
    }
}

/// Where on the bike a component sits, for parts that come in pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    Front,
    Rear,
    None,
}

impl Default for Location {
    fn default() -> Self {
        Location::None
    }
}

/// How a component's starting wear reference was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaselineMethod {
    Manual,
    Inferred,
    Default,
}

impl Default for BaselineMethod {
    fn default() -> Self {
        BaselineMethod::Default
    }
}

/// Trustworthiness of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Urgency class for a component.
///
/// Variants are declared in ascending severity so `Ord`/`max` pick the
/// most urgent status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    AllGood,
    DueSoon,
    DueNow,
    Overdue,
}

/// Per-component static facts owned by the CRUD layer and mutated only by
/// service events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBaseline {
    pub component_id: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub is_stock: bool,
    pub service_interval_hours: f64,
    /// When the component was added to the bike; the accumulation window
    /// start when no service has ever been logged.
    pub installed_at: DateTime<Utc>,
    #[serde(default)]
    pub last_serviced_at: Option<DateTime<Utc>>,
    /// Starting wear (0-100) carried into the first accumulation window.
    #[serde(default)]
    pub baseline_wear_percent: Option<f64>,
    #[serde(default)]
    pub baseline_method: BaselineMethod,
    /// How well supported the starting wear estimate is, for inferred
    /// baselines.
    #[serde(default)]
    pub baseline_confidence: Option<Confidence>,
    /// Additive interval extension from snoozes. Zero means the component
    /// is in its normal state.
    #[serde(default)]
    pub snoozed_hours: f64,
    /// Optimistic-concurrency stamp, bumped on every mutation.
    #[serde(default)]
    pub version: u64,
}

impl ComponentBaseline {
    /// Service interval including any snooze extension.
    pub fn effective_interval_hours(&self) -> f64 {
        self.service_interval_hours + self.snoozed_hours
    }
}

/// A single ride from the external ride ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRecord {
    pub id: String,
    pub bike_id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    #[serde(default)]
    pub distance_miles: f64,
    #[serde(default)]
    pub elevation_gain_feet: f64,
    #[serde(default)]
    pub avg_speed_mph: Option<f64>,
    #[serde(default)]
    pub temperature_f: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
}

/// A bike and its tracked components, as handed over by the CRUD layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    pub id: String,
    pub display_name: String,
    pub components: Vec<ComponentBaseline>,
}

/// One causal factor's share of a component's accumulated wear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WearDriver {
    /// Stable factor key ("steepness", "hours", ...).
    pub factor: String,
    pub label: String,
    /// Percentage share of total accumulated wear, 0-100.
    pub contribution: f64,
}

/// Immutable prediction snapshot for a single component. Rebuilt wholesale
/// on every recomputation, never patched.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentPrediction {
    pub component_id: String,
    pub component_type: ComponentType,
    pub location: Location,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub status: Status,
    /// Signed; negative means overdue. Clamp only for display.
    pub hours_remaining: f64,
    pub rides_remaining_estimate: u32,
    pub confidence: Confidence,
    /// Total hours on the component since installation.
    pub current_hours: f64,
    /// Effective interval (including snooze) the prediction was made against.
    pub service_interval_hours: f64,
    pub hours_since_service: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drivers: Option<Vec<WearDriver>>,
}

/// Prediction roll-up for one bike, components ordered most urgent first.
#[derive(Debug, Clone, Serialize)]
pub struct BikePredictionSummary {
    pub bike_id: String,
    pub bike_name: String,
    pub components: Vec<ComponentPrediction>,
    /// The most urgent component; `None` when every component is ALL_GOOD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_component: Option<ComponentPrediction>,
    pub overall_status: Status,
    pub due_now_count: usize,
    pub due_soon_count: usize,
    pub generated_at: DateTime<Utc>,
}
