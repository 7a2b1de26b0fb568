//! Ingestion diagnostics.
//!
//! Workbook ingestion is tolerant: a missing learning curve falls back to the
//! default, a bad order date clamps to the end of the horizon, rows for
//! styles outside the plan are dropped. Every such decision is recorded as an
//! [`IngestIssue`] in an [`IngestLog`] that travels with the records, and the
//! CLI decides how to surface it. Library code never logs.

use serde::Serialize;

/// A recoverable oddity noticed while reading a workbook or building the
/// model from its records. Fatal problems (missing sheet, non-positive SAM,
/// empty capability set) are [`crate::SewError`]s instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestIssue {
    /// A row whose required values were missing or malformed; dropped.
    UnusableRow {
        sheet: &'static str,
        row: usize,
        reason: &'static str,
    },
    /// A date cell that could not be parsed. The associated quantity clamps
    /// to the last day of the horizon.
    UnparseableDate {
        sheet: &'static str,
        row: usize,
        field: &'static str,
    },
    /// A definition repeated in the workbook; the first occurrence wins.
    Duplicate { what: &'static str, name: String },
    /// A reference to a name that is not part of this plan; ignored.
    UnknownName {
        context: &'static str,
        name: String,
    },
    /// No usable learning curve anywhere in the workbook; the default
    /// three-point curve applies.
    MissingLearningCurve,
}

impl std::fmt::Display for IngestIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestIssue::UnusableRow { sheet, row, reason } => {
                write!(f, "{sheet} row {row}: {reason}, row dropped")
            }
            IngestIssue::UnparseableDate { sheet, row, field } => {
                write!(
                    f,
                    "{sheet} row {row}: cannot parse '{field}', clamping to the last day"
                )
            }
            IngestIssue::Duplicate { what, name } => {
                write!(f, "duplicate {what} '{name}', keeping the first definition")
            }
            IngestIssue::UnknownName { context, name } => {
                write!(f, "{context} names '{name}', which is not in this plan; ignored")
            }
            IngestIssue::MissingLearningCurve => {
                write!(f, "no learning curve in the workbook, using the default curve")
            }
        }
    }
}

/// Running record of one ingestion: element counts plus every issue worth
/// telling the planner about.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestLog {
    pub styles: usize,
    pub lines: usize,
    pub calendar_days: usize,
    pub orders: usize,
    /// Rows referencing lines or styles outside this plan. Order books
    /// routinely cover the whole factory, so these are counted rather than
    /// reported one by one.
    pub foreign_rows: usize,
    pub issues: Vec<IngestIssue>,
}

impl IngestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, issue: IngestIssue) {
        self.issues.push(issue);
    }

    pub fn note_foreign_row(&mut self) {
        self.foreign_rows += 1;
    }

    /// True when nothing was dropped, defaulted or clamped.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.foreign_rows == 0
    }

    /// Rows dropped outright (unusable, as opposed to merely foreign).
    pub fn dropped_rows(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, IngestIssue::UnusableRow { .. }))
            .count()
    }

    /// One-line account of the ingestion for the log.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} styles, {} lines, {} days, {} orders",
            self.styles, self.lines, self.calendar_days, self.orders
        );
        if self.foreign_rows > 0 {
            s.push_str(&format!(", {} foreign rows dropped", self.foreign_rows));
        }
        if self.is_clean() {
            s.push_str("; clean");
        } else if !self.issues.is_empty() {
            s.push_str(&format!("; issues: {}", self.issues.len()));
        }
        s
    }
}
