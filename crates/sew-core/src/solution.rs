//! Decision variable and evaluated schedule.
//!
//! [`Assignment`] is the flat `L·T` style matrix the search mutates;
//! [`Solution`] is an assignment plus the full derived trajectory produced by
//! one evaluator call. Note that the evaluator returns the *realised*
//! assignment: the material-availability rule may rewrite cells, so the
//! matrix inside a `Solution` can differ from the one that was requested.

use crate::ids::{LineId, StyleId};
use crate::model::ProblemModel;
use serde::{Deserialize, Serialize};

/// Which operator produced a candidate solution, for search statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Greedy seed produced by the evaluator
    Initial,
    /// Two days swapped on one line
    Swap,
    /// A block of days overwritten with one style
    ReassignBlock,
    /// One day overwritten
    ReassignSingle,
    /// Uniformly random slots blanked and repaired
    RandomDestroy,
    /// Changeover-incurring slots blanked and repaired
    WorstSetupDestroy,
    /// A contiguous window on one line (spilling to a neighbour) blanked
    ZoneDestroy,
}

impl MoveKind {
    pub fn label(self) -> &'static str {
        match self {
            MoveKind::Initial => "initial",
            MoveKind::Swap => "swap",
            MoveKind::ReassignBlock => "reassign_block",
            MoveKind::ReassignSingle => "reassign_single",
            MoveKind::RandomDestroy => "random_destroy",
            MoveKind::WorstSetupDestroy => "worst_setup_destroy",
            MoveKind::ZoneDestroy => "zone_destroy",
        }
    }
}

/// Dense `L·T` assignment matrix. `None` marks a slot blanked by a destroy
/// operator; such holes exist only between destroy and repair, and every
/// evaluated solution carries a fully assigned matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    lines: usize,
    horizon: usize,
    slots: Vec<Option<StyleId>>,
}

impl Assignment {
    /// All slots unassigned
    pub fn unassigned(lines: usize, horizon: usize) -> Self {
        Self {
            lines,
            horizon,
            slots: vec![None; lines * horizon],
        }
    }

    pub fn num_lines(&self) -> usize {
        self.lines
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Flat index of slot `(l, t)`, `t` in `1..=horizon`
    pub fn slot(&self, l: LineId, t: usize) -> usize {
        l.index() * self.horizon + (t - 1)
    }

    pub fn get(&self, l: LineId, t: usize) -> Option<StyleId> {
        self.slots[self.slot(l, t)]
    }

    pub fn set(&mut self, l: LineId, t: usize, style: Option<StyleId>) {
        let idx = self.slot(l, t);
        self.slots[idx] = style;
    }

    /// Raw slot view, row-major by line
    pub fn slots(&self) -> &[Option<StyleId>] {
        &self.slots
    }

    pub fn is_fully_assigned(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Slots where the two assignments differ, as
    /// `(flat_slot, self_value, other_value)` in ascending slot order.
    pub fn diff(&self, other: &Assignment) -> Vec<(usize, Option<StyleId>, Option<StyleId>)> {
        self.slots
            .iter()
            .zip(other.slots.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, (a, b))| (i, *a, *b))
            .collect()
    }
}

/// One changeover event: the line left `from` for `to` at day `day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub line: LineId,
    /// `None` when the line had no day-0 style
    pub from: Option<StyleId>,
    pub to: StyleId,
    pub day: usize,
}

/// A fully evaluated schedule: realised assignment plus the derived
/// production/shipment/backlog trajectory and the cost breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Realised assignment after material-availability repair
    pub assignment: Assignment,
    /// Units produced per `(line, day)` slot, of the style assigned there
    pub production: Vec<f64>,
    /// Experience days per `(line, day)` slot
    pub experience: Vec<f64>,
    /// Efficiency per `(line, day)` slot, in `[0, 1]`
    pub efficiency: Vec<f64>,
    /// Units shipped per `(style, day)`
    pub shipment: Vec<f64>,
    /// Units produced per `(style, day)`, summed over lines
    pub produced: Vec<f64>,
    /// Changeover events in chronological order
    pub changes: Vec<ChangeEvent>,
    /// Backlog per style after the final day
    pub final_backlog: Vec<f64>,
    pub total_setup: f64,
    pub total_late: f64,
    pub total_exp: f64,
    /// `total_setup + total_late − total_exp`; `+∞` when evaluation was pruned
    pub total_cost: f64,
    /// Operator that produced this candidate, if any
    pub move_kind: Option<MoveKind>,
}

impl Solution {
    /// Empty shell for an assignment; the evaluator fills the derived fields.
    pub fn shell(assignment: Assignment, num_styles: usize) -> Self {
        let n_slots = assignment.num_lines() * assignment.horizon();
        let n_style_days = num_styles * assignment.horizon();
        Self {
            assignment,
            production: vec![0.0; n_slots],
            experience: vec![0.0; n_slots],
            efficiency: vec![0.0; n_slots],
            shipment: vec![0.0; n_style_days],
            produced: vec![0.0; n_style_days],
            changes: Vec::new(),
            final_backlog: vec![0.0; num_styles],
            total_setup: 0.0,
            total_late: 0.0,
            total_exp: 0.0,
            total_cost: 0.0,
            move_kind: None,
        }
    }

    /// Units produced on line `l` at day `t` (of the assigned style)
    pub fn production_at(&self, l: LineId, t: usize) -> f64 {
        self.production[self.assignment.slot(l, t)]
    }

    /// Units of style `s` produced on line `l` at day `t`
    pub fn production_for(&self, l: LineId, s: StyleId, t: usize) -> f64 {
        if self.assignment.get(l, t) == Some(s) {
            self.production_at(l, t)
        } else {
            0.0
        }
    }

    pub fn efficiency_at(&self, l: LineId, t: usize) -> f64 {
        self.efficiency[self.assignment.slot(l, t)]
    }

    pub fn experience_at(&self, l: LineId, t: usize) -> f64 {
        self.experience[self.assignment.slot(l, t)]
    }

    fn style_day(&self, s: StyleId, t: usize) -> usize {
        s.index() * self.assignment.horizon() + (t - 1)
    }

    /// Units of style `s` shipped on day `t`
    pub fn shipment_of(&self, s: StyleId, t: usize) -> f64 {
        self.shipment[self.style_day(s, t)]
    }

    /// Units of style `s` sewn on day `t`, all lines combined
    pub fn produced_of(&self, s: StyleId, t: usize) -> f64 {
        self.produced[self.style_day(s, t)]
    }

    pub fn changeover_count(&self) -> usize {
        self.changes.len()
    }

    pub fn is_pruned(&self) -> bool {
        self.total_cost.is_infinite()
    }

    /// Format a human-readable summary
    pub fn summary(&self, model: &ProblemModel) -> String {
        let mut s = String::new();
        s.push_str(&format!("Schedule Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Total Cost: {:.2}\n", self.total_cost));
        s.push_str(&format!("  Setup:      {:.2}\n", self.total_setup));
        s.push_str(&format!("  Late:       {:.2}\n", self.total_late));
        s.push_str(&format!("  Experience: -{:.2}\n", self.total_exp));
        s.push_str(&format!("Changeovers: {}\n", self.changeover_count()));

        let open_backlog: Vec<_> = model
            .styles()
            .filter(|&st| self.final_backlog[st.index()] > 1e-6)
            .collect();
        if open_backlog.is_empty() {
            s.push_str("Backlog: none\n");
        } else {
            s.push_str("Backlog:\n");
            for st in open_backlog {
                s.push_str(&format!(
                    "  {}: {:.0}\n",
                    model.style_name(st),
                    self.final_backlog[st.index()]
                ));
            }
        }
        s
    }
}
