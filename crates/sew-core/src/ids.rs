//! Dense identifiers for styles and lines.
//!
//! Workbooks key everything by free-form names. The model interns those names
//! once at construction and every hot-path table is indexed by these dense
//! ids; the string mapping survives only for report generation.

use serde::{Deserialize, Serialize};

/// Dense identifier for a garment style (index into the model's style tables)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleId(pub u16);

impl StyleId {
    pub fn new(id: u16) -> Self {
        StyleId(id)
    }

    /// Index into per-style tables
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense identifier for a sewing line (index into the model's line tables)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub u16);

impl LineId {
    pub fn new(id: u16) -> Self {
        LineId(id)
    }

    /// Index into per-line tables
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
