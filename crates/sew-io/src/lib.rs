//! # sew-io: Workbook ingestion and report generation
//!
//! The I/O edges of the scheduler:
//!
//! - [`workbook`]: reads the factory planning workbook (xlsx) into
//!   [`sew_core::InputRecords`], with flexible header handling and an
//!   [`sew_core::IngestLog`] companion noting everything that was defaulted,
//!   clamped or dropped.
//! - [`report`]: writes the styled schedule report: a colour-coded
//!   `Line-Schedule` sheet plus one inventory-ledger sheet per style.
//! - [`ledger`]: rebuilds the per-style day-by-day accounting view from a
//!   model and a solution.
//! - [`persist`]: saves/loads the final solution as JSON.

pub mod ledger;
pub mod persist;
pub mod report;
pub mod workbook;

pub use ledger::{style_ledger, LedgerRow};
pub use persist::{load_solution, save_solution};
pub use report::write_schedule_report;
pub use workbook::{read_workbook, IngestResult};
