use assert_cmd::Command;
use predicates::prelude::*;
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

fn minimal_workbook() -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();

    book.new_sheet("style_input").unwrap();
    set_text(&mut book, "style_input", 1, 1, "Style");
    set_text(&mut book, "style_input", 2, 1, "SAM");
    set_text(&mut book, "style_input", 1, 2, "AB-100");
    set_number(&mut book, "style_input", 2, 2, 10.0);

    book.new_sheet("line_input").unwrap();
    set_text(&mut book, "line_input", 1, 1, "Line");
    set_text(&mut book, "line_input", 2, 1, "Sewer");
    set_text(&mut book, "line_input", 1, 2, "L1");
    set_number(&mut book, "line_input", 2, 2, 10.0);

    book.new_sheet("line_date_input").unwrap();
    set_text(&mut book, "line_date_input", 1, 1, "Date");
    set_text(&mut book, "line_date_input", 2, 1, "Line");
    set_text(&mut book, "line_date_input", 3, 1, "Working Hour");
    for day in 0..3u32 {
        set_text(
            &mut book,
            "line_date_input",
            1,
            2 + day,
            &format!("2026-03-{:02}", 2 + day),
        );
        set_text(&mut book, "line_date_input", 2, 2 + day, "L1");
        set_number(&mut book, "line_date_input", 3, 2 + day, 8.0);
    }

    book.new_sheet("order_input").unwrap();
    set_text(&mut book, "order_input", 1, 1, "Style2");
    set_text(&mut book, "order_input", 2, 1, "Sum");
    set_text(&mut book, "order_input", 3, 1, "Exf-SX");
    set_text(&mut book, "order_input", 4, 1, "Fabric start ETA RG");
    set_text(&mut book, "order_input", 1, 2, "AB-100");
    set_number(&mut book, "order_input", 2, 2, 200.0);
    set_text(&mut book, "order_input", 3, 2, "2026-03-04");
    set_text(&mut book, "order_input", 4, 2, "2026-03-02");

    book.new_sheet("enable_style_line_input").unwrap();
    set_text(&mut book, "enable_style_line_input", 1, 1, "Line");
    set_text(&mut book, "enable_style_line_input", 2, 1, "AB-100");
    set_text(&mut book, "enable_style_line_input", 1, 2, "L1");
    set_number(&mut book, "enable_style_line_input", 2, 2, 1.0);

    book
}

#[test]
fn schedules_a_workbook_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let workbook_path = dir.path().join("plan.xlsx");
    umya_spreadsheet::writer::xlsx::write(&minimal_workbook(), &workbook_path).unwrap();
    let out_dir = dir.path().join("result");

    let mut cmd = Command::cargo_bin("sew").unwrap();
    cmd.arg(&workbook_path)
        .arg("--out")
        .arg(&out_dir)
        .arg("--max-iter")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schedule Summary"));

    assert!(out_dir.join("schedule.json").exists());
    assert!(out_dir.join("schedule_report.xlsx").exists());
}

#[test]
fn missing_workbook_fails_with_diagnostic() {
    let mut cmd = Command::cargo_bin("sew").unwrap();
    cmd.arg("/nonexistent/plan.xlsx").assert().failure();
}

#[test]
fn invalid_workbook_fails_with_diagnostic() {
    // A workbook without the required line_input sheet must abort non-zero.
    let dir = tempfile::tempdir().unwrap();
    let workbook_path = dir.path().join("broken.xlsx");
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet("style_input").unwrap();
    set_text(&mut book, "style_input", 1, 1, "Style");
    set_text(&mut book, "style_input", 2, 1, "SAM");
    umya_spreadsheet::writer::xlsx::write(&book, &workbook_path).unwrap();

    let mut cmd = Command::cargo_bin("sew").unwrap();
    cmd.arg(&workbook_path).assert().failure();
}
