//! End-to-end: build a workbook, ingest it, solve, and write the report.

use sew_algo::{TabuConfig, TabuSearch};
use sew_core::{IngestIssue, IngestLog, ProblemModel};
use sew_io::workbook::ingest;
use std::path::Path;
use std::time::Duration;
use umya_spreadsheet::Spreadsheet;

fn set_text(book: &mut Spreadsheet, sheet: &str, col: u32, row: u32, value: &str) {
    book.get_sheet_by_name_mut(sheet)
        .unwrap()
        .get_cell_mut((col, row))
        .set_value(value);
}

fn set_number(book: &mut Spreadsheet, sheet: &str, col: u32, row: u32, value: f64) {
    book.get_sheet_by_name_mut(sheet)
        .unwrap()
        .get_cell_mut((col, row))
        .set_value_number(value);
}

/// A compact but complete planning workbook: two styles, two lines, five
/// working days, two orders, a full capability matrix and a learning curve
/// whose header is not on the first row.
fn sample_workbook() -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();

    book.new_sheet("style_input").unwrap();
    for (col, header) in ["Style", "SAM", "Fabric Processing Time", "Product Finishing Time"]
        .iter()
        .enumerate()
    {
        set_text(&mut book, "style_input", col as u32 + 1, 1, header);
    }
    set_text(&mut book, "style_input", 1, 2, "AB-100");
    set_number(&mut book, "style_input", 2, 2, 10.0);
    set_number(&mut book, "style_input", 3, 2, 0.0);
    set_number(&mut book, "style_input", 4, 2, 0.0);
    set_text(&mut book, "style_input", 1, 3, "CD-200");
    set_number(&mut book, "style_input", 2, 3, 12.0);
    // Blank processing times on CD-200 default to one day each.

    book.new_sheet("line_input").unwrap();
    for (col, header) in ["Line", "Sewer", "Experience", "Current Style"].iter().enumerate() {
        set_text(&mut book, "line_input", col as u32 + 1, 1, header);
    }
    set_text(&mut book, "line_input", 1, 2, "L1");
    set_number(&mut book, "line_input", 2, 2, 10.0);
    set_number(&mut book, "line_input", 3, 2, 0.0);
    set_text(&mut book, "line_input", 4, 2, "AB-100");
    set_text(&mut book, "line_input", 1, 3, "L2");
    set_number(&mut book, "line_input", 2, 3, 8.0);
    set_number(&mut book, "line_input", 3, 3, 2.0);

    // Title row above the real header, as exported planning calendars have.
    book.new_sheet("line_date_input").unwrap();
    set_text(&mut book, "line_date_input", 1, 1, "Working calendar");
    for (col, header) in ["Date", "Line", "Working Hour"].iter().enumerate() {
        set_text(&mut book, "line_date_input", col as u32 + 1, 2, header);
    }
    let mut row = 3;
    for day in 2..=6 {
        for line in ["L1", "L2"] {
            set_text(&mut book, "line_date_input", 1, row, &format!("2026-03-{day:02}"));
            set_text(&mut book, "line_date_input", 2, row, line);
            set_number(&mut book, "line_date_input", 3, row, 8.0);
            row += 1;
        }
    }

    book.new_sheet("order_input").unwrap();
    for (col, header) in ["Style2", "Sum", "Exf-SX", "Fabric start ETA RG"].iter().enumerate() {
        set_text(&mut book, "order_input", col as u32 + 1, 1, header);
    }
    set_text(&mut book, "order_input", 1, 2, "AB-100");
    set_number(&mut book, "order_input", 2, 2, 400.0);
    set_text(&mut book, "order_input", 3, 2, "2026-03-04");
    set_text(&mut book, "order_input", 4, 2, "2026-03-02");
    set_text(&mut book, "order_input", 1, 3, "CD-200");
    set_number(&mut book, "order_input", 2, 3, 300.0);
    set_text(&mut book, "order_input", 3, 3, "2026-03-06");
    set_text(&mut book, "order_input", 4, 3, "2026-03-03");
    // An order for a style outside this plan: skipped quietly.
    set_text(&mut book, "order_input", 1, 4, "ZZ-999");
    set_number(&mut book, "order_input", 2, 4, 50.0);

    book.new_sheet("enable_style_line_input").unwrap();
    set_text(&mut book, "enable_style_line_input", 1, 1, "Line");
    set_text(&mut book, "enable_style_line_input", 2, 1, "AB-100");
    set_text(&mut book, "enable_style_line_input", 3, 1, "CD-200");
    set_text(&mut book, "enable_style_line_input", 1, 2, "L1");
    set_number(&mut book, "enable_style_line_input", 2, 2, 1.0);
    set_number(&mut book, "enable_style_line_input", 3, 2, 1.0);
    set_text(&mut book, "enable_style_line_input", 1, 3, "L2");
    set_number(&mut book, "enable_style_line_input", 2, 3, 1.0);
    set_number(&mut book, "enable_style_line_input", 3, 3, 0.0);

    book.new_sheet("learning_curve_input").unwrap();
    set_text(&mut book, "learning_curve_input", 1, 1, "Learning curve");
    set_text(&mut book, "learning_curve_input", 1, 2, "Experience");
    set_text(&mut book, "learning_curve_input", 2, 2, "Efficiency");
    for (i, (x, y)) in [(1.0, 0.30), (10.0, 0.65), (20.0, 0.85)].iter().enumerate() {
        set_number(&mut book, "learning_curve_input", 1, 3 + i as u32, *x);
        set_number(&mut book, "learning_curve_input", 2, 3 + i as u32, *y);
    }

    book
}

fn build_model(book: &Spreadsheet) -> (ProblemModel, IngestLog) {
    let ingested = ingest(book).unwrap();
    let mut diag = ingested.diagnostics;
    let model = ProblemModel::from_records(&ingested.records, &mut diag).unwrap();
    (model, diag)
}

#[test]
fn ingests_the_sample_workbook() {
    let (model, diag) = build_model(&sample_workbook());

    assert_eq!(model.num_styles(), 2);
    assert_eq!(model.num_lines(), 2);
    assert_eq!(model.horizon(), 5);

    let ab = model.style_id("AB-100").unwrap();
    let cd = model.style_id("CD-200").unwrap();
    let l1 = model.line_id("L1").unwrap();
    let l2 = model.line_id("L2").unwrap();

    assert_eq!(model.sam(ab), 10.0);
    assert_eq!(model.fabric_lead(ab), 0);
    // Blank processing times defaulted to 1.
    assert_eq!(model.fabric_lead(cd), 1);
    assert_eq!(model.finish_lead(cd), 1);

    assert_eq!(model.sewers(l1), 10);
    assert_eq!(model.y0(l1), Some(ab));
    assert_eq!(model.exp0(l2), 2.0);
    assert_eq!(model.hours(l1, 3), 8.0);

    // Day ordinals follow the sorted calendar dates 02..06 March.
    assert_eq!(model.demand(ab, 3), 400.0);
    assert_eq!(model.fabric_in(ab, 1), 400.0);
    assert_eq!(model.demand(cd, 5), 300.0);

    // L2 cannot run CD-200.
    assert!(model.is_enabled(l1, cd));
    assert!(!model.is_enabled(l2, cd));

    // The workbook curve (not the default) was picked up.
    assert!((model.curve().eff(20.0) - 0.85).abs() < 1e-9);
    assert!(!diag.issues.contains(&IngestIssue::MissingLearningCurve));
    // The foreign-style order row was dropped quietly.
    assert_eq!(diag.foreign_rows, 1);
}

#[test]
fn missing_required_sheet_is_fatal() {
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet("style_input").unwrap();
    set_text(&mut book, "style_input", 1, 1, "Style");
    set_text(&mut book, "style_input", 2, 1, "SAM");
    let err = ingest(&book).unwrap_err();
    assert!(err.to_string().contains("line_input"));
}

#[test]
fn solves_and_reports_from_the_workbook() {
    let (model, _) = build_model(&sample_workbook());
    let config = TabuConfig {
        max_iter: 20,
        max_time: Duration::from_secs(30),
        seed: 17,
        ..TabuConfig::default()
    };
    let (best, stats) = TabuSearch::new(&model, config).run();
    assert!(best.total_cost.is_finite());
    assert_eq!(stats.iterations, 20);

    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("schedule_report.xlsx");
    sew_io::write_schedule_report(&model, &best, &report_path).unwrap();
    assert!(Path::new(&report_path).exists());

    let json_path = dir.path().join("schedule.json");
    sew_io::save_solution(&best, &json_path).unwrap();
    let restored = sew_io::load_solution(&json_path).unwrap();
    assert_eq!(restored.assignment, best.assignment);
}
