//! Helpers for constructing small planning models in tests.

use chrono::NaiveDate;
use sew_core::records::*;
use sew_core::{IngestLog, ProblemModel};

/// Builder for compact test models. All lines share an 8-hour calendar over
/// the requested horizon unless overridden, and every (line, style) pair is
/// enabled unless explicitly disabled.
pub struct ModelFixture {
    days: usize,
    records: InputRecords,
    hour_overrides: Vec<(String, usize, f64)>,
    disabled: Vec<(String, String)>,
}

impl ModelFixture {
    pub fn new(days: usize) -> Self {
        Self {
            days,
            records: InputRecords::new(),
            hour_overrides: Vec::new(),
            disabled: Vec::new(),
        }
    }

    /// Calendar date behind day ordinal `t`
    pub fn date(t: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(t as u64))
            .unwrap()
    }

    pub fn style(mut self, name: &str, sam: f64, fabric_lead: usize, finish_lead: usize) -> Self {
        self.records.styles.push(StyleRecord {
            id: name.into(),
            sam,
            fabric_lead,
            finish_lead,
        });
        self
    }

    pub fn line(mut self, name: &str, sewers: u32, initial_experience: f64) -> Self {
        self.records.lines.push(LineRecord {
            id: name.into(),
            sewers,
            initial_experience,
            initial_style: None,
        });
        self
    }

    pub fn line_running(
        mut self,
        name: &str,
        sewers: u32,
        initial_experience: f64,
        initial_style: &str,
    ) -> Self {
        self.records.lines.push(LineRecord {
            id: name.into(),
            sewers,
            initial_experience,
            initial_style: Some(initial_style.into()),
        });
        self
    }

    pub fn hours(mut self, line: &str, day: usize, h: f64) -> Self {
        self.hour_overrides.push((line.into(), day, h));
        self
    }

    pub fn disable(mut self, line: &str, style: &str) -> Self {
        self.disabled.push((line.into(), style.into()));
        self
    }

    /// Order contributing demand at `demand_day` and fabric at `fabric_day`
    pub fn order(mut self, style: &str, qty: f64, demand_day: usize, fabric_day: usize) -> Self {
        self.records.orders.push(OrderRecord {
            style: style.into(),
            quantity: qty,
            demand_date: Some(Self::date(demand_day)),
            fabric_eta_date: Some(Self::date(fabric_day)),
        });
        self
    }

    /// Demand with no matching fabric arrival
    pub fn demand_only(mut self, style: &str, qty: f64, demand_day: usize) -> Self {
        self.records.orders.push(OrderRecord {
            style: style.into(),
            quantity: qty,
            demand_date: Some(Self::date(demand_day)),
            fabric_eta_date: None,
        });
        self
    }

    pub fn initial_fabric(mut self, style: &str, qty: f64) -> Self {
        self.records.initial_fabric.push((style.into(), qty));
        self
    }

    pub fn initial_experience_on(mut self, line: &str, style: &str, days: f64) -> Self {
        self.records.line_style_experience.push(LineStyleExperienceRecord {
            line: line.into(),
            style: style.into(),
            days,
        });
        self
    }

    pub fn same_family(mut self, a: &str, b: &str) -> Self {
        self.records.same_family.push((a.into(), b.into()));
        self
    }

    pub fn costs(mut self, costs: CostParams) -> Self {
        self.records.costs = Some(costs);
        self
    }

    pub fn build(mut self) -> ProblemModel {
        // Dense 8h calendar, then apply overrides.
        for line in &self.records.lines {
            for t in 1..=self.days {
                let hours = self
                    .hour_overrides
                    .iter()
                    .rev()
                    .find(|(l, d, _)| *l == line.id && *d == t)
                    .map(|(_, _, h)| *h)
                    .unwrap_or(8.0);
                self.records.calendar.push(CalendarRecord {
                    line: line.id.clone(),
                    date: Self::date(t),
                    working_hours: hours,
                });
            }
        }
        // Full capability matrix minus explicit holes.
        for line in &self.records.lines {
            for style in &self.records.styles {
                let enabled = !self
                    .disabled
                    .iter()
                    .any(|(l, s)| *l == line.id && *s == style.id);
                self.records.capabilities.push(CapabilityRecord {
                    line: line.id.clone(),
                    style: style.id.clone(),
                    enabled,
                });
            }
        }

        let mut diag = IngestLog::new();
        ProblemModel::from_records(&self.records, &mut diag)
            .expect("test fixture should build a valid model")
    }
}
