//! Styled xlsx schedule report.
//!
//! One `Line-Schedule` sheet with five rows per line (assigned style,
//! produced quantity, efficiency, experience, and a max-efficiency
//! placeholder) under two header rows (date and weekday), then one ledger
//! sheet per style with the nine accounting rows. Style cells are
//! colour-coded from a fixed palette so a schedule block reads at a glance.

use crate::ledger::style_ledger;
use chrono::Datelike;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use sew_core::{ProblemModel, SewError, SewResult, Solution, StyleId};
use std::collections::HashMap;
use std::path::Path;

/// Rotating fill palette for style cells.
const STYLE_PALETTE: [u32; 15] = [
    0xE6194B, 0x3CB44B, 0xFFE119, 0x4363D8, 0xF58231, 0x911EB4, 0x46FBEB, 0xF032E6, 0xBCF60C,
    0xFABEBE, 0x008080, 0xE6BEFF, 0x9A6324, 0xFFFAC8, 0x800000,
];

const SCHEDULE_ROW_TYPES: [&str; 5] = ["Style", "Qty", "Eff", "Exp", "MaxEff"];

const LEDGER_METRICS: [&str; 9] = [
    "Demand",
    "Fabric Receiving",
    "Beg. Inv Fabric",
    "Producing",
    "End. Inv Fabric",
    "Beg. Inv FG",
    "Shipping",
    "End. Inv FG",
    "Backlog",
];

fn style_color(style: StyleId) -> Color {
    Color::RGB(STYLE_PALETTE[style.index() % STYLE_PALETTE.len()])
}

/// Write the full schedule report to `path`.
pub fn write_schedule_report(
    model: &ProblemModel,
    solution: &Solution,
    path: impl AsRef<Path>,
) -> SewResult<()> {
    let mut workbook = Workbook::new();
    write_line_schedule(model, solution, &mut workbook).map_err(xlsx_err)?;
    for style in model.styles() {
        write_style_sheet(model, solution, style, &mut workbook).map_err(xlsx_err)?;
    }
    workbook.save(path.as_ref()).map_err(xlsx_err)?;
    Ok(())
}

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> SewError {
    SewError::Other(format!("report write failed: {e}"))
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xD3D3D3))
        .set_border(FormatBorder::Thin)
}

fn weekday_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xEFEFEF))
        .set_border(FormatBorder::Thin)
        .set_font_size(9)
}

fn center_format() -> Format {
    Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn quantity_format() -> Format {
    Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_num_format("#,##0")
}

fn percent_format() -> Format {
    Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_num_format("0%")
}

fn experience_format() -> Format {
    Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_num_format("0.0")
}

fn style_fill_format(style: StyleId) -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_background_color(style_color(style))
        .set_font_color(Color::White)
}

/// Date headers over the horizon: `dd/mm` plus the weekday name.
fn date_headers(model: &ProblemModel) -> (Vec<String>, Vec<String>) {
    let dates = model.dates();
    let day_names = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    let date_row = dates.iter().map(|d| d.format("%d/%m").to_string()).collect();
    let weekday_row = dates
        .iter()
        .map(|d| day_names[d.weekday().num_days_from_monday() as usize].to_string())
        .collect();
    (date_row, weekday_row)
}

fn write_two_header_rows(
    sheet: &mut Worksheet,
    corner: &str,
    extra_corner: Option<&str>,
    date_row: &[String],
    weekday_row: &[String],
    corner_fmt: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let weekday_fmt = weekday_format();
    let data_col0: u16 = if extra_corner.is_some() { 2 } else { 1 };

    sheet.write_string_with_format(0, 0, corner, corner_fmt)?;
    sheet.write_string_with_format(1, 0, "", corner_fmt)?;
    if let Some(second) = extra_corner {
        sheet.write_string_with_format(0, 1, second, corner_fmt)?;
        sheet.write_string_with_format(1, 1, "Day", &weekday_fmt)?;
    }
    for (i, value) in date_row.iter().enumerate() {
        sheet.write_string_with_format(0, data_col0 + i as u16, value, corner_fmt)?;
    }
    for (i, value) in weekday_row.iter().enumerate() {
        sheet.write_string_with_format(1, data_col0 + i as u16, value, &weekday_fmt)?;
    }
    Ok(())
}

fn write_line_schedule(
    model: &ProblemModel,
    solution: &Solution,
    workbook: &mut Workbook,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Line-Schedule")?;

    let (date_row, weekday_row) = date_headers(model);
    let header_fmt = header_format();
    write_two_header_rows(sheet, "Line", Some("Type"), &date_row, &weekday_row, &header_fmt)?;

    let center_fmt = center_format();
    let qty_fmt = quantity_format();
    let pct_fmt = percent_format();
    let exp_fmt = experience_format();
    let style_fmts: HashMap<StyleId, Format> = model
        .styles()
        .map(|s| (s, style_fill_format(s)))
        .collect();

    let mut row: u32 = 2;
    for l in model.lines() {
        sheet.merge_range(row, 0, row + 4, 0, model.line_name(l), &center_fmt)?;
        for (offset, row_type) in SCHEDULE_ROW_TYPES.iter().enumerate() {
            sheet.write_string_with_format(row + offset as u32, 1, *row_type, &center_fmt)?;
        }

        for t in model.days() {
            let col = (t + 1) as u16;
            match solution.assignment.get(l, t) {
                Some(style) => {
                    let fill = style_fmts.get(&style).unwrap_or(&center_fmt);
                    sheet.write_string_with_format(row, col, model.style_name(style), fill)?;
                }
                None => {
                    sheet.write_string_with_format(row, col, "", &center_fmt)?;
                }
            }
            sheet.write_number_with_format(row + 1, col, solution.production_at(l, t), &qty_fmt)?;
            let eff = solution.efficiency_at(l, t);
            sheet.write_number_with_format(row + 2, col, eff, &pct_fmt)?;
            sheet.write_number_with_format(row + 3, col, solution.experience_at(l, t), &exp_fmt)?;
            // Placeholder row mirroring efficiency.
            sheet.write_number_with_format(row + 4, col, eff, &pct_fmt)?;
        }
        row += 5;
    }

    sheet.set_freeze_panes(2, 2)?;
    Ok(())
}

fn write_style_sheet(
    model: &ProblemModel,
    solution: &Solution,
    style: StyleId,
    workbook: &mut Workbook,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(style_sheet_name(model.style_name(style)))?;

    let (date_row, weekday_row) = date_headers(model);
    let style_header_fmt = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_background_color(style_color(style))
        .set_font_color(Color::White);
    write_two_header_rows(sheet, "Metric", None, &date_row, &weekday_row, &style_header_fmt)?;

    let center_fmt = center_format();
    let qty_fmt = quantity_format();
    let rows = style_ledger(model, solution, style);

    for (offset, metric) in LEDGER_METRICS.iter().enumerate() {
        let row = (offset + 2) as u32;
        sheet.write_string_with_format(row, 0, *metric, &center_fmt)?;
        for ledger_row in &rows {
            let col = ledger_row.day as u16;
            let value = match *metric {
                "Demand" => ledger_row.demand,
                "Fabric Receiving" => ledger_row.fabric_received,
                "Beg. Inv Fabric" => ledger_row.beginning_fabric,
                "Producing" => ledger_row.produced,
                "End. Inv Fabric" => ledger_row.ending_fabric,
                "Beg. Inv FG" => ledger_row.beginning_fg,
                "Shipping" => ledger_row.shipped,
                "End. Inv FG" => ledger_row.ending_fg,
                _ => ledger_row.backlog,
            };
            sheet.write_number_with_format(row, col, value, &qty_fmt)?;
        }
    }

    sheet.set_column_width(0, 22)?;
    for t in model.days() {
        sheet.set_column_width(t as u16, 10)?;
    }
    sheet.set_freeze_panes(2, 1)?;
    Ok(())
}

/// Sheet names are capped at 31 characters by the xlsx format.
fn style_sheet_name(style_name: &str) -> String {
    let truncated: String = style_name.chars().take(28).collect();
    format!("S_{truncated}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_sheet_name_truncation() {
        assert_eq!(style_sheet_name("AB-100"), "S_AB-100");
        let long = "X".repeat(40);
        let name = style_sheet_name(&long);
        assert_eq!(name.len(), 30);
        assert!(name.starts_with("S_"));
    }

    #[test]
    fn test_palette_cycles() {
        let a = style_color(StyleId::new(0));
        let b = style_color(StyleId::new(15));
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }
}
