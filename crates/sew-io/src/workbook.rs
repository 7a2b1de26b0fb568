//! Planning-workbook ingestion.
//!
//! Reads the factory's xlsx workbook into [`InputRecords`], tolerating the
//! formatting drift real planning files accumulate: stray whitespace and
//! non-breaking spaces in headers, header rows that are not the first row,
//! the learning curve living under several possible sheet names, and dates
//! entered as text or as Excel serial numbers.
//!
//! Recoverable problems (dropped rows, unparseable dates, a missing learning
//! curve) are noted in an [`IngestLog`]; only structural problems (a required
//! sheet or column missing) are fatal.

use chrono::NaiveDate;
use sew_core::records::*;
use sew_core::{IngestIssue, IngestLog, SewError, SewResult};
use std::collections::HashSet;
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Sheet names that may hold the learning curve, probed in order.
const LEARNING_CURVE_SHEETS: &[&str] =
    &["learning_curve_input", "Learning Curve", "LC_Input", "Sheet1"];

/// Rows scanned when auto-detecting a header row.
const HEADER_SCAN_LIMIT: usize = 20;

/// Ingested records plus the log accumulated along the way.
#[derive(Debug)]
pub struct IngestResult {
    pub records: InputRecords,
    pub diagnostics: IngestLog,
}

/// Read a planning workbook from disk.
pub fn read_workbook(path: impl AsRef<Path>) -> SewResult<IngestResult> {
    let book = umya_spreadsheet::reader::xlsx::read(path.as_ref())
        .map_err(|e| SewError::Workbook(format!("cannot read workbook: {e}")))?;
    ingest(&book)
}

/// Ingest an already-loaded spreadsheet.
pub fn ingest(book: &Spreadsheet) -> SewResult<IngestResult> {
    let mut diag = IngestLog::new();
    let mut records = InputRecords::new();

    read_styles(book, &mut records, &mut diag)?;
    read_lines(book, &mut records, &mut diag)?;

    let known_styles: HashSet<String> = records.styles.iter().map(|s| s.id.clone()).collect();
    let known_lines: HashSet<String> = records.lines.iter().map(|l| l.id.clone()).collect();

    read_calendar(book, &known_lines, &mut records, &mut diag)?;
    read_orders(book, &known_styles, &mut records, &mut diag)?;
    read_capabilities(book, &known_lines, &known_styles, &mut records)?;
    read_line_style_experience(book, &known_lines, &known_styles, &mut records);
    read_learning_curve(book, &mut records);

    Ok(IngestResult {
        records,
        diagnostics: diag,
    })
}

// =========================================================================
// Per-sheet readers
// =========================================================================

fn read_styles(
    book: &Spreadsheet,
    records: &mut InputRecords,
    diag: &mut IngestLog,
) -> SewResult<()> {
    let table = required_table(book, "style_input")?;
    let col_style = table.require_col("style_input", "Style")?;
    let col_sam = table.require_col("style_input", "SAM")?;
    let col_fab = table.col("Fabric Processing Time");
    let col_fin = table.col("Product Finishing Time");

    for (row_no, row) in &table.rows {
        let id = cell(row, col_style);
        if id.is_empty() {
            continue;
        }
        let sam = match parse_number(cell(row, col_sam)) {
            Some(v) => v,
            None => {
                diag.note(IngestIssue::UnusableRow {
                    sheet: "style_input",
                    row: *row_no,
                    reason: "no usable SAM",
                });
                continue;
            }
        };
        // Missing processing times default to one day, as planning files
        // frequently leave them blank.
        let fabric_lead = col_fab
            .and_then(|c| parse_number(cell(row, c)))
            .map(|v| v.max(0.0) as usize)
            .unwrap_or(1);
        let finish_lead = col_fin
            .and_then(|c| parse_number(cell(row, c)))
            .map(|v| v.max(0.0) as usize)
            .unwrap_or(1);

        records.styles.push(StyleRecord {
            id: id.to_string(),
            sam,
            fabric_lead,
            finish_lead,
        });
    }
    Ok(())
}

fn read_lines(
    book: &Spreadsheet,
    records: &mut InputRecords,
    diag: &mut IngestLog,
) -> SewResult<()> {
    let table = required_table(book, "line_input")?;
    let col_line = table.require_col("line_input", "Line")?;
    let col_sewer = table.require_col("line_input", "Sewer")?;
    let col_exp = table.col("Experience");
    let col_current = table.col("Current Style");

    for (row_no, row) in &table.rows {
        let id = cell(row, col_line);
        if id.is_empty() {
            continue;
        }
        let sewers = match parse_number(cell(row, col_sewer)) {
            Some(v) if v >= 0.0 => v.round() as u32,
            _ => {
                diag.note(IngestIssue::UnusableRow {
                    sheet: "line_input",
                    row: *row_no,
                    reason: "no usable sewer count",
                });
                continue;
            }
        };
        let initial_experience = col_exp
            .and_then(|c| parse_number(cell(row, c)))
            .unwrap_or(0.0);
        let initial_style = col_current
            .map(|c| cell(row, c))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        records.lines.push(LineRecord {
            id: id.to_string(),
            sewers,
            initial_experience,
            initial_style,
        });
    }
    Ok(())
}

fn read_calendar(
    book: &Spreadsheet,
    known_lines: &HashSet<String>,
    records: &mut InputRecords,
    diag: &mut IngestLog,
) -> SewResult<()> {
    // The header of this sheet floats: usually the second row, sometimes the
    // first. Scan for the row holding both required columns.
    let grid = sheet_grid(book, "line_date_input")
        .ok_or_else(|| SewError::Workbook("missing sheet 'line_date_input'".into()))?;
    let header_row = grid.detect_header(&["Date", "Line"]).ok_or_else(|| {
        SewError::Workbook("sheet 'line_date_input' has no Date/Line header".into())
    })?;
    let table = grid.table_at(header_row);
    let col_date = table.require_col("line_date_input", "Date")?;
    let col_line = table.require_col("line_date_input", "Line")?;
    let col_hours = table.col("Working Hour");

    for (row_no, row) in &table.rows {
        let line = cell(row, col_line);
        if line.is_empty() && cell(row, col_date).is_empty() {
            continue;
        }
        let date = match parse_date(cell(row, col_date)) {
            Some(d) => d,
            None => {
                diag.note(IngestIssue::UnusableRow {
                    sheet: "line_date_input",
                    row: *row_no,
                    reason: "unparseable date",
                });
                continue;
            }
        };
        if !known_lines.contains(line) {
            diag.note_foreign_row();
            continue;
        }
        let working_hours = col_hours
            .and_then(|c| parse_number(cell(row, c)))
            .unwrap_or(0.0);

        records.calendar.push(CalendarRecord {
            line: line.to_string(),
            date,
            working_hours,
        });
    }
    Ok(())
}

fn read_orders(
    book: &Spreadsheet,
    known_styles: &HashSet<String>,
    records: &mut InputRecords,
    diag: &mut IngestLog,
) -> SewResult<()> {
    let table = required_table(book, "order_input")?;
    let col_style = table.require_col("order_input", "Style2")?;
    let col_qty = table.require_col("order_input", "Sum")?;
    let col_demand = table.col("Exf-SX");
    let col_fabric = table.col("Fabric start ETA RG");

    for (row_no, row) in &table.rows {
        let style = cell(row, col_style);
        if style.is_empty() {
            continue;
        }
        // Order books cover the whole factory; rows for styles outside this
        // plan are expected and dropped without noise.
        if !known_styles.contains(style) {
            diag.note_foreign_row();
            continue;
        }
        let quantity = match parse_number(cell(row, col_qty)) {
            Some(v) => v,
            None => {
                diag.note(IngestIssue::UnusableRow {
                    sheet: "order_input",
                    row: *row_no,
                    reason: "no usable quantity",
                });
                continue;
            }
        };

        let demand_date = parse_order_date(cell(row, col_demand.unwrap_or(usize::MAX)));
        if demand_date.is_none() && order_cell_present(row, col_demand) {
            diag.note(IngestIssue::UnparseableDate {
                sheet: "order_input",
                row: *row_no,
                field: "Exf-SX",
            });
        }
        let fabric_eta_date = parse_order_date(cell(row, col_fabric.unwrap_or(usize::MAX)));
        if fabric_eta_date.is_none() && order_cell_present(row, col_fabric) {
            diag.note(IngestIssue::UnparseableDate {
                sheet: "order_input",
                row: *row_no,
                field: "Fabric start ETA RG",
            });
        }

        records.orders.push(OrderRecord {
            style: style.to_string(),
            quantity,
            demand_date,
            fabric_eta_date,
        });
    }
    Ok(())
}

fn read_capabilities(
    book: &Spreadsheet,
    known_lines: &HashSet<String>,
    known_styles: &HashSet<String>,
    records: &mut InputRecords,
) -> SewResult<()> {
    let table = required_table(book, "enable_style_line_input")?;
    for (line, style, value) in matrix_cells(&table, known_lines, known_styles) {
        let enabled = parse_number(&value).map(|v| v != 0.0).unwrap_or(false);
        records.capabilities.push(CapabilityRecord {
            line,
            style,
            enabled,
        });
    }
    Ok(())
}

fn read_line_style_experience(
    book: &Spreadsheet,
    known_lines: &HashSet<String>,
    known_styles: &HashSet<String>,
    records: &mut InputRecords,
) {
    // Optional sheet; header floats like the calendar's.
    let Some(grid) = sheet_grid(book, "line_style_input") else {
        return;
    };
    let Some(header_row) = grid.detect_header(&["Line"]) else {
        return;
    };
    let table = grid.table_at(header_row);
    for (line, style, value) in matrix_cells(&table, known_lines, known_styles) {
        if let Some(days) = parse_number(&value) {
            if days != 0.0 {
                records
                    .line_style_experience
                    .push(LineStyleExperienceRecord { line, style, days });
            }
        }
    }
}

fn read_learning_curve(book: &Spreadsheet, records: &mut InputRecords) {
    for &sheet in LEARNING_CURVE_SHEETS {
        let Some(grid) = sheet_grid(book, sheet) else {
            continue;
        };
        let Some(header_row) = grid.detect_header(&["Experience", "Efficiency"]) else {
            continue;
        };
        let table = grid.table_at(header_row);
        let (Some(col_exp), Some(col_eff)) = (table.col("Experience"), table.col("Efficiency"))
        else {
            continue;
        };
        for (_, row) in &table.rows {
            if let (Some(experience), Some(efficiency)) = (
                parse_number(cell(row, col_exp)),
                parse_number(cell(row, col_eff)),
            ) {
                records.learning_curve.push(LearningCurveRecord {
                    experience,
                    efficiency,
                });
            }
        }
        if !records.learning_curve.is_empty() {
            return;
        }
    }
    // Leaving the list empty makes the model builder fall back to the
    // default curve (with a diagnostic).
}

// =========================================================================
// Sheet-grid plumbing
// =========================================================================

/// All cell values of a sheet, cleaned: NBSP and zero-width characters
/// stripped, surrounding whitespace trimmed.
struct SheetGrid {
    rows: Vec<Vec<String>>,
}

/// A header row plus the data rows below it. Row numbers are 1-based sheet
/// rows, for diagnostics.
struct Table {
    headers: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl SheetGrid {
    fn from_sheet(sheet: &Worksheet) -> Self {
        let (max_col, max_row) = sheet.get_highest_column_and_row();
        let rows = (1..=max_row)
            .map(|r| {
                (1..=max_col)
                    .map(|c| clean_text(&sheet.get_value((c, r))))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Index of the first row (within the scan limit) containing every
    /// required column name, case-insensitively.
    fn detect_header(&self, required: &[&str]) -> Option<usize> {
        let wanted: Vec<String> = required.iter().map(|s| s.to_lowercase()).collect();
        self.rows
            .iter()
            .take(HEADER_SCAN_LIMIT)
            .position(|row| {
                let values: HashSet<String> = row.iter().map(|v| v.to_lowercase()).collect();
                wanted.iter().all(|w| values.contains(w))
            })
    }

    fn table_at(&self, header_row: usize) -> Table {
        let headers = self.rows.get(header_row).cloned().unwrap_or_default();
        let rows = self
            .rows
            .iter()
            .enumerate()
            .skip(header_row + 1)
            .map(|(i, row)| (i + 1, row.clone()))
            .collect();
        Table { headers, rows }
    }
}

impl Table {
    fn col(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require_col(&self, sheet: &str, name: &str) -> SewResult<usize> {
        self.col(name).ok_or_else(|| {
            SewError::Workbook(format!("sheet '{sheet}' is missing column '{name}'"))
        })
    }
}

fn sheet_grid(book: &Spreadsheet, name: &str) -> Option<SheetGrid> {
    book.get_sheet_by_name(name).map(SheetGrid::from_sheet)
}

fn required_table(book: &Spreadsheet, name: &str) -> SewResult<Table> {
    let grid = sheet_grid(book, name)
        .ok_or_else(|| SewError::Workbook(format!("missing sheet '{name}'")))?;
    Ok(grid.table_at(0))
}

/// Matrix sheets: first column holds line names, remaining headers are style
/// names. Unknown lines and styles are skipped.
fn matrix_cells(
    table: &Table,
    known_lines: &HashSet<String>,
    known_styles: &HashSet<String>,
) -> Vec<(String, String, String)> {
    let mut out = Vec::new();
    let style_cols: Vec<(usize, &String)> = table
        .headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, h)| known_styles.contains(*h))
        .collect();
    for (_, row) in &table.rows {
        let line = cell(row, 0);
        if !known_lines.contains(line) {
            continue;
        }
        for (col, style) in &style_cols {
            out.push((
                line.to_string(),
                (*style).clone(),
                cell(row, *col).to_string(),
            ));
        }
    }
    out
}

// =========================================================================
// Cell parsing
// =========================================================================

fn clean_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ").replace('\u{200b}', "").trim().to_string()
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

fn order_cell_present(row: &[String], col: Option<usize>) -> bool {
    col.map(|c| !cell(row, c).is_empty()).unwrap_or(false)
}

fn parse_number(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', "").parse::<f64>().ok()
}

fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        None
    } else {
        parse_date(raw)
    }
}

/// Dates appear as ISO text, day-first text, datetime text, or raw Excel
/// serial numbers.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    // Excel serial: days since 1899-12-30.
    if let Ok(serial) = raw.parse::<f64>() {
        if serial > 0.0 && serial < 200_000.0 {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return epoch.checked_add_days(chrono::Days::new(serial as u64));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Style\u{a0}Name\u{200b} "), "Style Name");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("8"), Some(8.0));
        assert_eq!(parse_number("1,250.5"), Some(1250.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_date("2026-03-02"), Some(expected));
        assert_eq!(parse_date("02/03/2026"), Some(expected));
        assert_eq!(parse_date("2026-03-02 00:00:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_excel_serial_date() {
        // 2026-03-02 is serial 46083 from the 1899-12-30 epoch.
        let expected = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_date("46083"), Some(expected));
    }

    #[test]
    fn test_detect_header_skips_title_rows() {
        let grid = SheetGrid {
            rows: vec![
                vec!["Working calendar".into(), "".into(), "".into()],
                vec!["Date".into(), "Line".into(), "Working Hour".into()],
                vec!["2026-03-02".into(), "L1".into(), "8".into()],
            ],
        };
        assert_eq!(grid.detect_header(&["Date", "Line"]), Some(1));
        let table = grid.table_at(1);
        assert_eq!(table.col("Working Hour"), Some(2));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].0, 3);
    }
}
