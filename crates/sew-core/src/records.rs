//! Input records produced by workbook ingestion.
//!
//! One record type per planning concept. The ingester is responsible for
//! matching flexible column headers and producing these; the model builder
//! consumes them and is the single place where names are resolved to dense
//! ids and dates to day ordinals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One garment style and its processing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRecord {
    /// Style name as it appears in the workbook
    pub id: String,
    /// Standard allowed minutes per unit
    pub sam: f64,
    /// Days between fabric arrival and usability
    pub fabric_lead: usize,
    /// Days between sewing and shippable finished goods
    pub finish_lead: usize,
}

/// One sewing line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    /// Line name as it appears in the workbook
    pub id: String,
    /// Workforce size
    pub sewers: u32,
    /// Experience days carried into day 1
    pub initial_experience: f64,
    /// Style already running on the line at day 0, if any
    pub initial_style: Option<String>,
}

/// Working hours for one (line, date) slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRecord {
    pub line: String,
    pub date: NaiveDate,
    pub working_hours: f64,
}

/// One order: contributes demand at the ex-factory date and fabric at the ETA
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub style: String,
    pub quantity: f64,
    /// Ex-factory date; `None` when the cell was blank or unparseable
    pub demand_date: Option<NaiveDate>,
    /// Fabric arrival date; `None` when the cell was blank or unparseable
    pub fabric_eta_date: Option<NaiveDate>,
}

/// Whether a line is able to produce a style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub line: String,
    pub style: String,
    pub enabled: bool,
}

/// Initial learning offset for a (line, style) pair, in experience days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineStyleExperienceRecord {
    pub line: String,
    pub style: String,
    pub days: f64,
}

/// One learning-curve breakpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearningCurveRecord {
    pub experience: f64,
    pub efficiency: f64,
}

/// Cost parameters, either workbook-supplied or defaulted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostParams {
    /// Fixed cost per changeover event
    pub setup_cost: f64,
    /// Reward per accumulated experience day
    pub exp_reward: f64,
    /// Per-unit-per-day lateness penalty applied to styles without their own
    pub default_late_penalty: f64,
    /// Time-discount rate applied to per-day costs
    pub discount_alpha: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            setup_cost: 150.0,
            exp_reward: 1.0,
            default_late_penalty: 50.0,
            discount_alpha: 0.05,
        }
    }
}

/// Everything ingestion hands to the model builder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputRecords {
    pub styles: Vec<StyleRecord>,
    pub lines: Vec<LineRecord>,
    pub calendar: Vec<CalendarRecord>,
    pub orders: Vec<OrderRecord>,
    pub capabilities: Vec<CapabilityRecord>,
    pub line_style_experience: Vec<LineStyleExperienceRecord>,
    /// Ordered by experience; empty means "use the default curve"
    pub learning_curve: Vec<LearningCurveRecord>,
    /// Unordered pairs of style names that keep experience across changeover
    pub same_family: Vec<(String, String)>,
    /// Per-style initial fabric inventory overrides (units)
    pub initial_fabric: Vec<(String, f64)>,
    /// Per-style initial finished-goods inventory overrides (units)
    pub initial_product: Vec<(String, f64)>,
    /// Per-style initial backlog overrides (units)
    pub initial_backlog: Vec<(String, f64)>,
    pub costs: Option<CostParams>,
}

impl InputRecords {
    pub fn new() -> Self {
        Self::default()
    }
}
