//! Immutable, id-encoded view of the planning inputs.
//!
//! [`ProblemModel`] is built once per run from the ingested records, then
//! shared immutably by the evaluator and the neighbour generator. All
//! hot-path tables are dense vectors indexed by [`StyleId`]/[`LineId`] and
//! day ordinal; string names survive only for report generation.

use crate::curve::EfficiencyCurve;
use crate::diagnostics::{IngestIssue, IngestLog};
use crate::ids::{LineId, StyleId};
use crate::records::InputRecords;
use crate::{SewError, SewResult};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// The planning problem: lines, styles, horizon, capability matrix, demand
/// and fabric arrivals, learning parameters, and cost coefficients.
///
/// Immutable after construction. Day ordinals run `1..=horizon()`.
#[derive(Debug, Clone)]
pub struct ProblemModel {
    style_names: Vec<String>,
    line_names: Vec<String>,
    style_index: HashMap<String, StyleId>,
    line_index: HashMap<String, LineId>,

    horizon: usize,
    /// Real calendar dates behind the 1..=T ordinals, for report headers
    dates: Vec<NaiveDate>,

    // Per style
    sam: Vec<f64>,
    fabric_lead: Vec<usize>,
    finish_lead: Vec<usize>,
    late_penalty: Vec<f64>,
    i0_fabric: Vec<f64>,
    i0_product: Vec<f64>,
    backlog0: Vec<f64>,

    // Per line
    sewers: Vec<u32>,
    exp0: Vec<f64>,
    y0: Vec<Option<StyleId>>,

    // Per (line, day)
    hours: Vec<f64>,
    base_capacity_minutes: Vec<f64>,

    // Per (line, style)
    enabled: Vec<bool>,
    lexp0: Vec<f64>,
    /// Enabled styles per line, ascending by id; never empty
    allowed: Vec<Vec<StyleId>>,

    // Per (style, day)
    demand: Vec<f64>,
    fabric_in: Vec<f64>,

    setup_cost: f64,
    exp_reward: f64,
    discount_alpha: f64,
    /// Stored symmetrically: both (a,b) and (b,a) are present
    same_family: HashSet<(StyleId, StyleId)>,

    curve: EfficiencyCurve,
}

impl ProblemModel {
    /// Build and validate the model from ingested records.
    ///
    /// Fatal conditions: no styles, no working days, non-positive SAM,
    /// unknown style/line references in calendar, orders, capabilities or
    /// experience records, and any line left without an enabled style.
    /// Recoverable oddities (defaulted curve, unknown initial style, ...)
    /// are appended to `diag`.
    pub fn from_records(
        records: &InputRecords,
        diag: &mut IngestLog,
    ) -> SewResult<ProblemModel> {
        // --- styles ---
        let mut style_names = Vec::new();
        let mut style_index = HashMap::new();
        let mut sam = Vec::new();
        let mut fabric_lead = Vec::new();
        let mut finish_lead = Vec::new();
        for rec in &records.styles {
            if style_index.contains_key(&rec.id) {
                diag.note(IngestIssue::Duplicate {
                    what: "style",
                    name: rec.id.clone(),
                });
                continue;
            }
            if !(rec.sam > 0.0) {
                return Err(SewError::Validation(format!(
                    "style '{}' has non-positive SAM {}",
                    rec.id, rec.sam
                )));
            }
            let id = StyleId::new(style_names.len() as u16);
            style_index.insert(rec.id.clone(), id);
            style_names.push(rec.id.clone());
            sam.push(rec.sam);
            fabric_lead.push(rec.fabric_lead);
            finish_lead.push(rec.finish_lead);
        }
        if style_names.is_empty() {
            return Err(SewError::Validation("no styles in input".into()));
        }
        let num_styles = style_names.len();

        // --- lines ---
        let mut line_names = Vec::new();
        let mut line_index = HashMap::new();
        let mut sewers = Vec::new();
        let mut exp0 = Vec::new();
        let mut y0 = Vec::new();
        for rec in &records.lines {
            if line_index.contains_key(&rec.id) {
                diag.note(IngestIssue::Duplicate {
                    what: "line",
                    name: rec.id.clone(),
                });
                continue;
            }
            let id = LineId::new(line_names.len() as u16);
            line_index.insert(rec.id.clone(), id);
            line_names.push(rec.id.clone());
            sewers.push(rec.sewers);
            exp0.push(rec.initial_experience);
            let initial = match &rec.initial_style {
                Some(name) => match style_index.get(name) {
                    Some(&sid) => Some(sid),
                    None => {
                        diag.note(IngestIssue::UnknownName {
                            context: "initial style",
                            name: name.clone(),
                        });
                        None
                    }
                },
                None => None,
            };
            y0.push(initial);
        }
        if line_names.is_empty() {
            return Err(SewError::Validation("no lines in input".into()));
        }
        let num_lines = line_names.len();

        // --- calendar: dates -> dense 1..=T ordinals ---
        let mut unique_dates: Vec<NaiveDate> = records
            .calendar
            .iter()
            .map(|c| c.date)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        unique_dates.sort();
        if unique_dates.is_empty() {
            return Err(SewError::Validation("calendar has no working days".into()));
        }
        let horizon = unique_dates.len();
        let date_ordinal: HashMap<NaiveDate, usize> = unique_dates
            .iter()
            .enumerate()
            .map(|(i, &d)| (d, i + 1))
            .collect();

        let mut hours = vec![0.0; num_lines * horizon];
        for rec in &records.calendar {
            let line = *line_index.get(&rec.line).ok_or_else(|| {
                SewError::Validation(format!("calendar references unknown line '{}'", rec.line))
            })?;
            if rec.working_hours < 0.0 {
                return Err(SewError::Validation(format!(
                    "negative working hours {} for line '{}' on {}",
                    rec.working_hours, rec.line, rec.date
                )));
            }
            let t = date_ordinal[&rec.date];
            hours[line.index() * horizon + (t - 1)] = rec.working_hours;
        }

        let mut base_capacity_minutes = vec![0.0; num_lines * horizon];
        for l in 0..num_lines {
            for t in 0..horizon {
                base_capacity_minutes[l * horizon + t] =
                    hours[l * horizon + t] * 60.0 * sewers[l] as f64;
            }
        }

        // --- orders: demand and fabric arrivals ---
        let mut demand = vec![0.0; num_styles * horizon];
        let mut fabric_in = vec![0.0; num_styles * horizon];
        for rec in &records.orders {
            let style = *style_index.get(&rec.style).ok_or_else(|| {
                SewError::Validation(format!("order references unknown style '{}'", rec.style))
            })?;
            // Dates outside the horizon (or unparseable upstream) clamp to
            // the final day.
            let t_d = rec
                .demand_date
                .and_then(|d| date_ordinal.get(&d).copied())
                .unwrap_or(horizon);
            let t_f = rec
                .fabric_eta_date
                .and_then(|d| date_ordinal.get(&d).copied())
                .unwrap_or(horizon);
            demand[style.index() * horizon + (t_d - 1)] += rec.quantity;
            fabric_in[style.index() * horizon + (t_f - 1)] += rec.quantity;
        }

        // --- capability matrix ---
        let mut enabled = vec![false; num_lines * num_styles];
        for rec in &records.capabilities {
            let line = *line_index.get(&rec.line).ok_or_else(|| {
                SewError::Validation(format!("capability references unknown line '{}'", rec.line))
            })?;
            let style = *style_index.get(&rec.style).ok_or_else(|| {
                SewError::Validation(format!(
                    "capability references unknown style '{}'",
                    rec.style
                ))
            })?;
            if rec.enabled {
                enabled[line.index() * num_styles + style.index()] = true;
            }
        }
        let allowed: Vec<Vec<StyleId>> = (0..num_lines)
            .map(|l| {
                (0..num_styles)
                    .filter(|&s| enabled[l * num_styles + s])
                    .map(|s| StyleId::new(s as u16))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (l, styles) in allowed.iter().enumerate() {
            if styles.is_empty() {
                return Err(SewError::Validation(format!(
                    "line '{}' has no enabled styles",
                    line_names[l]
                )));
            }
        }

        // --- learning offsets per (line, style) ---
        let mut lexp0 = vec![0.0; num_lines * num_styles];
        for rec in &records.line_style_experience {
            let line = *line_index.get(&rec.line).ok_or_else(|| {
                SewError::Validation(format!(
                    "line/style experience references unknown line '{}'",
                    rec.line
                ))
            })?;
            let style = *style_index.get(&rec.style).ok_or_else(|| {
                SewError::Validation(format!(
                    "line/style experience references unknown style '{}'",
                    rec.style
                ))
            })?;
            lexp0[line.index() * num_styles + style.index()] = rec.days;
        }

        // --- learning curve ---
        let curve = if records.learning_curve.is_empty() {
            diag.note(IngestIssue::MissingLearningCurve);
            EfficiencyCurve::default_curve()
        } else {
            EfficiencyCurve::new(
                records
                    .learning_curve
                    .iter()
                    .map(|r| (r.experience, r.efficiency))
                    .collect(),
            )?
        };

        // --- initial inventories ---
        // Fabric is seeded large when the workbook does not say otherwise.
        let mut i0_fabric = vec![1e6; num_styles];
        let mut i0_product = vec![0.0; num_styles];
        let mut backlog0 = vec![0.0; num_styles];
        for (dst, overrides, context) in [
            (&mut i0_fabric, &records.initial_fabric, "initial fabric inventory"),
            (&mut i0_product, &records.initial_product, "initial FG inventory"),
            (&mut backlog0, &records.initial_backlog, "initial backlog"),
        ] {
            for (name, value) in overrides.iter() {
                match style_index.get(name) {
                    Some(&sid) => dst[sid.index()] = *value,
                    None => diag.note(IngestIssue::UnknownName {
                        context,
                        name: name.clone(),
                    }),
                }
            }
        }

        // --- same-family pairs (experience-preserving changeovers) ---
        let mut same_family = HashSet::new();
        for (a, b) in &records.same_family {
            match (style_index.get(a), style_index.get(b)) {
                (Some(&ia), Some(&ib)) => {
                    same_family.insert((ia, ib));
                    same_family.insert((ib, ia));
                }
                _ => diag.note(IngestIssue::UnknownName {
                    context: "same-family pair",
                    name: format!("{a}/{b}"),
                }),
            }
        }

        let costs = records.costs.clone().unwrap_or_default();
        let late_penalty = vec![costs.default_late_penalty; num_styles];

        diag.styles = num_styles;
        diag.lines = num_lines;
        diag.calendar_days = horizon;
        diag.orders = records.orders.len();

        Ok(ProblemModel {
            style_names,
            line_names,
            style_index,
            line_index,
            horizon,
            dates: unique_dates,
            sam,
            fabric_lead,
            finish_lead,
            late_penalty,
            i0_fabric,
            i0_product,
            backlog0,
            sewers,
            exp0,
            y0,
            hours,
            base_capacity_minutes,
            enabled,
            lexp0,
            allowed,
            demand,
            fabric_in,
            setup_cost: costs.setup_cost,
            exp_reward: costs.exp_reward,
            discount_alpha: costs.discount_alpha,
            same_family,
            curve,
        })
    }

    pub fn num_styles(&self) -> usize {
        self.style_names.len()
    }

    pub fn num_lines(&self) -> usize {
        self.line_names.len()
    }

    /// Number of planning days `T`; day ordinals run `1..=horizon()`.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn styles(&self) -> impl Iterator<Item = StyleId> {
        (0..self.style_names.len()).map(|i| StyleId::new(i as u16))
    }

    pub fn lines(&self) -> impl Iterator<Item = LineId> {
        (0..self.line_names.len()).map(|i| LineId::new(i as u16))
    }

    /// Day ordinals in ascending order
    pub fn days(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.horizon
    }

    /// Calendar dates behind the ordinals, ascending; `dates()[t-1]` is day `t`
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn style_name(&self, s: StyleId) -> &str {
        &self.style_names[s.index()]
    }

    pub fn line_name(&self, l: LineId) -> &str {
        &self.line_names[l.index()]
    }

    pub fn style_id(&self, name: &str) -> Option<StyleId> {
        self.style_index.get(name).copied()
    }

    pub fn line_id(&self, name: &str) -> Option<LineId> {
        self.line_index.get(name).copied()
    }

    pub fn sam(&self, s: StyleId) -> f64 {
        self.sam[s.index()]
    }

    pub fn fabric_lead(&self, s: StyleId) -> usize {
        self.fabric_lead[s.index()]
    }

    pub fn finish_lead(&self, s: StyleId) -> usize {
        self.finish_lead[s.index()]
    }

    pub fn late_penalty(&self, s: StyleId) -> f64 {
        self.late_penalty[s.index()]
    }

    pub fn sewers(&self, l: LineId) -> u32 {
        self.sewers[l.index()]
    }

    /// Working hours of line `l` on day `t` (0 outside the calendar)
    pub fn hours(&self, l: LineId, t: usize) -> f64 {
        if t == 0 || t > self.horizon {
            return 0.0;
        }
        self.hours[l.index() * self.horizon + (t - 1)]
    }

    /// `hours · 60 · sewers`, precomputed
    pub fn base_capacity_minutes(&self, l: LineId, t: usize) -> f64 {
        if t == 0 || t > self.horizon {
            return 0.0;
        }
        self.base_capacity_minutes[l.index() * self.horizon + (t - 1)]
    }

    pub fn is_enabled(&self, l: LineId, s: StyleId) -> bool {
        self.enabled[l.index() * self.num_styles() + s.index()]
    }

    /// Enabled styles for a line, ascending by id; guaranteed non-empty
    pub fn allowed(&self, l: LineId) -> &[StyleId] {
        &self.allowed[l.index()]
    }

    /// Demand for style `s` due on day `t`; 0 outside the horizon
    pub fn demand(&self, s: StyleId, t: usize) -> f64 {
        if t == 0 || t > self.horizon {
            return 0.0;
        }
        self.demand[s.index() * self.horizon + (t - 1)]
    }

    /// Fabric quantity arriving for style `s` on day `t`; 0 outside the horizon
    pub fn fabric_in(&self, s: StyleId, t: usize) -> f64 {
        if t == 0 || t > self.horizon {
            return 0.0;
        }
        self.fabric_in[s.index() * self.horizon + (t - 1)]
    }

    pub fn total_demand(&self, s: StyleId) -> f64 {
        self.days().map(|t| self.demand(s, t)).sum()
    }

    /// Initial learning offset when line `l` switches onto style `s`
    pub fn lexp0(&self, l: LineId, s: StyleId) -> f64 {
        self.lexp0[l.index() * self.num_styles() + s.index()]
    }

    /// Experience the line carries into day 1
    pub fn exp0(&self, l: LineId) -> f64 {
        self.exp0[l.index()]
    }

    /// Style already running on the line at day 0, if any
    pub fn y0(&self, l: LineId) -> Option<StyleId> {
        self.y0[l.index()]
    }

    pub fn i0_fabric(&self, s: StyleId) -> f64 {
        self.i0_fabric[s.index()]
    }

    pub fn i0_product(&self, s: StyleId) -> f64 {
        self.i0_product[s.index()]
    }

    pub fn backlog0(&self, s: StyleId) -> f64 {
        self.backlog0[s.index()]
    }

    pub fn setup_cost(&self) -> f64 {
        self.setup_cost
    }

    pub fn exp_reward(&self) -> f64 {
        self.exp_reward
    }

    pub fn discount_alpha(&self) -> f64 {
        self.discount_alpha
    }

    /// Whether a changeover between the two styles preserves experience
    pub fn same_family(&self, from: StyleId, to: StyleId) -> bool {
        self.same_family.contains(&(from, to))
    }

    pub fn curve(&self) -> &EfficiencyCurve {
        &self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn small_records() -> InputRecords {
        let mut rec = InputRecords::new();
        rec.styles = vec![
            StyleRecord { id: "A".into(), sam: 10.0, fabric_lead: 0, finish_lead: 0 },
            StyleRecord { id: "B".into(), sam: 12.0, fabric_lead: 1, finish_lead: 1 },
        ];
        rec.lines = vec![
            LineRecord { id: "L1".into(), sewers: 10, initial_experience: 0.0, initial_style: None },
            LineRecord { id: "L2".into(), sewers: 8, initial_experience: 3.0, initial_style: Some("A".into()) },
        ];
        for day in 1..=3u32 {
            for line in ["L1", "L2"] {
                rec.calendar.push(CalendarRecord {
                    line: line.into(),
                    date: d(day),
                    working_hours: 8.0,
                });
            }
        }
        rec.orders = vec![OrderRecord {
            style: "A".into(),
            quantity: 100.0,
            demand_date: Some(d(2)),
            fabric_eta_date: Some(d(1)),
        }];
        for line in ["L1", "L2"] {
            for style in ["A", "B"] {
                rec.capabilities.push(CapabilityRecord {
                    line: line.into(),
                    style: style.into(),
                    enabled: true,
                });
            }
        }
        rec
    }

    #[test]
    fn test_build_small_model() {
        let mut diag = IngestLog::new();
        let model = ProblemModel::from_records(&small_records(), &mut diag).unwrap();

        assert_eq!(model.num_styles(), 2);
        assert_eq!(model.num_lines(), 2);
        assert_eq!(model.horizon(), 3);

        let a = model.style_id("A").unwrap();
        let l1 = model.line_id("L1").unwrap();
        assert_eq!(model.sam(a), 10.0);
        assert_eq!(model.hours(l1, 2), 8.0);
        assert_eq!(model.base_capacity_minutes(l1, 2), 8.0 * 60.0 * 10.0);
        assert_eq!(model.demand(a, 2), 100.0);
        assert_eq!(model.fabric_in(a, 1), 100.0);
        assert_eq!(model.total_demand(a), 100.0);
        // Default curve warning
        assert!(diag.issues.contains(&IngestIssue::MissingLearningCurve));
    }

    #[test]
    fn test_initial_style_resolution() {
        let mut diag = IngestLog::new();
        let model = ProblemModel::from_records(&small_records(), &mut diag).unwrap();
        let l2 = model.line_id("L2").unwrap();
        assert_eq!(model.y0(l2), model.style_id("A"));
        assert_eq!(model.y0(model.line_id("L1").unwrap()), None);
    }

    #[test]
    fn test_order_date_outside_horizon_clamps_to_last_day() {
        let mut rec = small_records();
        rec.orders.push(OrderRecord {
            style: "B".into(),
            quantity: 50.0,
            demand_date: Some(d(30)),
            fabric_eta_date: None,
        });
        let mut diag = IngestLog::new();
        let model = ProblemModel::from_records(&rec, &mut diag).unwrap();
        let b = model.style_id("B").unwrap();
        assert_eq!(model.demand(b, 3), 50.0);
        assert_eq!(model.fabric_in(b, 3), 50.0);
    }

    #[test]
    fn test_empty_capability_set_is_fatal() {
        let mut rec = small_records();
        rec.capabilities.retain(|c| c.line != "L2");
        let mut diag = IngestLog::new();
        let err = ProblemModel::from_records(&rec, &mut diag).unwrap_err();
        assert!(err.to_string().contains("L2"));
    }

    #[test]
    fn test_non_positive_sam_is_fatal() {
        let mut rec = small_records();
        rec.styles[0].sam = 0.0;
        let mut diag = IngestLog::new();
        assert!(ProblemModel::from_records(&rec, &mut diag).is_err());
    }

    #[test]
    fn test_unknown_order_style_is_fatal() {
        let mut rec = small_records();
        rec.orders.push(OrderRecord {
            style: "ZZ".into(),
            quantity: 1.0,
            demand_date: None,
            fabric_eta_date: None,
        });
        let mut diag = IngestLog::new();
        assert!(ProblemModel::from_records(&rec, &mut diag).is_err());
    }

    #[test]
    fn test_same_family_symmetry() {
        let mut rec = small_records();
        rec.same_family.push(("A".into(), "B".into()));
        let mut diag = IngestLog::new();
        let model = ProblemModel::from_records(&rec, &mut diag).unwrap();
        let a = model.style_id("A").unwrap();
        let b = model.style_id("B").unwrap();
        assert!(model.same_family(a, b));
        assert!(model.same_family(b, a));
    }

    #[test]
    fn test_default_inventories() {
        let mut diag = IngestLog::new();
        let model = ProblemModel::from_records(&small_records(), &mut diag).unwrap();
        let a = model.style_id("A").unwrap();
        assert_eq!(model.i0_fabric(a), 1e6);
        assert_eq!(model.i0_product(a), 0.0);
        assert_eq!(model.backlog0(a), 0.0);
    }
}
