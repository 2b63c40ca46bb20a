use crate::engine::{ChangeKind, DiffResult};
use crate::render::ReportRenderer;
use crate::report::DiffReport;
use csvdiff_common::{CsvDiffError, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

/// Excel renderer: a Summary sheet with per-file counts, a Differences
/// sheet with one row per change, and a Warnings sheet.
pub struct ExcelRenderer;

impl ReportRenderer for ExcelRenderer {
    fn render(&self, report: &DiffReport, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Summary").map_err(xlsx_err)?;
            write_summary_sheet(sheet, report, &header);
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Differences").map_err(xlsx_err)?;
            write_differences_sheet(sheet, report, &header);
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Warnings").map_err(xlsx_err)?;
            write_warnings_sheet(sheet, report, &header);
        }

        workbook.save(path).map_err(xlsx_err)?;
        Ok(())
    }
}

fn xlsx_err(e: XlsxError) -> CsvDiffError {
    CsvDiffError::Output(e.to_string())
}

fn write_summary_sheet(sheet: &mut Worksheet, report: &DiffReport, header: &Format) {
    let mut row = 0;
    sheet.write_string_with_format(row, 0, "Left", header).ok();
    if let Some(left) = report.left_root() {
        sheet.write_string(row, 1, left.display().to_string()).ok();
    }
    row += 1;
    sheet.write_string_with_format(row, 0, "Right", header).ok();
    if let Some(right) = report.right_root() {
        sheet
            .write_string(row, 1, right.display().to_string())
            .ok();
    }
    row += 1;
    sheet
        .write_string_with_format(row, 0, "Generated", header)
        .ok();
    sheet
        .write_string(
            row,
            1,
            report.created().format("%Y-%m-%d %H:%M:%S").to_string(),
        )
        .ok();
    row += 1;
    sheet
        .write_string_with_format(row, 0, "File pairs", header)
        .ok();
    sheet
        .write_number(row, 1, report.results().len() as f64)
        .ok();
    row += 1;
    sheet
        .write_string_with_format(row, 0, "Total differences", header)
        .ok();
    sheet.write_number(row, 1, report.total_diffs() as f64).ok();
    row += 2;

    let columns = [
        "File",
        "Left lines",
        "Right lines",
        "Adds",
        "Deletes",
        "Updates",
        "Moves",
        "Warnings",
    ];
    for (col, title) in columns.iter().enumerate() {
        sheet
            .write_string_with_format(row, col as u16, *title, header)
            .ok();
    }
    row += 1;

    for result in report.results() {
        sheet
            .write_string(row, 0, result.left_path.display().to_string())
            .ok();
        sheet.write_number(row, 1, result.left_lines as f64).ok();
        sheet.write_number(row, 2, result.right_lines as f64).ok();
        sheet
            .write_number(row, 3, result.count(ChangeKind::Add) as f64)
            .ok();
        sheet
            .write_number(row, 4, result.count(ChangeKind::Delete) as f64)
            .ok();
        sheet
            .write_number(row, 5, result.count(ChangeKind::Update) as f64)
            .ok();
        sheet
            .write_number(row, 6, result.count(ChangeKind::Move) as f64)
            .ok();
        sheet.write_number(row, 7, result.warnings.len() as f64).ok();
        row += 1;
    }
}

fn write_differences_sheet(sheet: &mut Worksheet, report: &DiffReport, header: &Format) {
    let columns = ["File", "Key", "Change", "Field", "Left", "Right"];
    for (col, title) in columns.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, header)
            .ok();
    }

    let mut row = 1;
    for result in report.results() {
        row = write_result_rows(sheet, result, row);
    }
}

fn write_result_rows(sheet: &mut Worksheet, result: &DiffResult, mut row: u32) -> u32 {
    let file = result.left_path.display().to_string();
    for entry in &result.diffs {
        match entry.kind {
            ChangeKind::Update => {
                for change in &entry.changes {
                    sheet.write_string(row, 0, &file).ok();
                    sheet.write_string(row, 1, &entry.key).ok();
                    sheet.write_string(row, 2, entry.kind.label()).ok();
                    sheet.write_string(row, 3, &change.field).ok();
                    sheet.write_string(row, 4, &change.left).ok();
                    sheet.write_string(row, 5, &change.right).ok();
                    row += 1;
                }
            }
            ChangeKind::Add | ChangeKind::Delete | ChangeKind::Move => {
                sheet.write_string(row, 0, &file).ok();
                sheet.write_string(row, 1, &entry.key).ok();
                sheet.write_string(row, 2, entry.kind.label()).ok();
                if let Some(left_row) = entry.left_row {
                    sheet.write_string(row, 4, format!("row {}", left_row)).ok();
                }
                if let Some(right_row) = entry.right_row {
                    sheet
                        .write_string(row, 5, format!("row {}", right_row))
                        .ok();
                }
                row += 1;
            }
            ChangeKind::Warning => {}
        }
    }
    row
}

fn write_warnings_sheet(sheet: &mut Worksheet, report: &DiffReport, header: &Format) {
    sheet.write_string_with_format(0, 0, "File", header).ok();
    sheet.write_string_with_format(0, 1, "Warning", header).ok();

    let mut row = 1;
    for result in report.results() {
        for warning in &result.warnings {
            sheet
                .write_string(row, 0, result.left_path.display().to_string())
                .ok();
            sheet.write_string(row, 1, warning).ok();
            row += 1;
        }
    }
}
