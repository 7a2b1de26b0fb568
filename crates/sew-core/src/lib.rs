//! # sew-core: Data model for apparel production scheduling
//!
//! Core types shared by the simulator, the neighbourhood search, and the
//! workbook I/O layer:
//!
//! - [`ProblemModel`]: immutable, id-encoded view of the planning inputs
//! - [`EfficiencyCurve`]: piecewise-linear learning curve with O(1) lookup
//! - [`Assignment`] / [`Solution`]: decision variable and evaluated schedule
//! - [`records`]: the input-record structs produced by workbook ingestion
//! - [`SewError`] / [`SewResult`]: unified error handling
//! - [`diagnostics`]: typed issue collection for tolerant ingestion
//!
//! Styles and lines are interned to dense [`StyleId`]/[`LineId`] integers at
//! model construction; every hot-path table is indexed by those ids and the
//! day ordinal. String names survive only at the I/O edges.

pub mod curve;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod model;
pub mod records;
pub mod solution;

pub use curve::EfficiencyCurve;
pub use diagnostics::{IngestIssue, IngestLog};
pub use error::{SewError, SewResult};
pub use ids::{LineId, StyleId};
pub use model::ProblemModel;
pub use records::{
    CalendarRecord, CapabilityRecord, CostParams, InputRecords, LearningCurveRecord,
    LineRecord, LineStyleExperienceRecord, OrderRecord, StyleRecord,
};
pub use solution::{Assignment, ChangeEvent, MoveKind, Solution};
