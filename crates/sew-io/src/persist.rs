//! Solution persistence.
//!
//! The final solution is stored as a single JSON document so a run can be
//! inspected or re-reported without re-solving. Style ids are stored in their
//! dense integer form; the workbook is the source of truth for names.

use sew_core::{SewResult, Solution};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serialise a solution to `path` as pretty-printed JSON.
pub fn save_solution(solution: &Solution, path: impl AsRef<Path>) -> SewResult<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), solution)?;
    Ok(())
}

/// Load a previously saved solution.
pub fn load_solution(path: impl AsRef<Path>) -> SewResult<Solution> {
    let file = File::open(path.as_ref())?;
    let solution = serde_json::from_reader(BufReader::new(file))?;
    Ok(solution)
}
