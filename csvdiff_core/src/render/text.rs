use crate::engine::{ChangeKind, DiffEntry, DiffResult};
use crate::render::ReportRenderer;
use crate::report::DiffReport;
use csvdiff_common::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Plain-text renderer, also serving `txt` and `csv` output requests.
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &DiffReport, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_report(report, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

pub(crate) fn write_report<W: Write>(report: &DiffReport, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "CSV Diff Report")?;
    writeln!(
        out,
        "Generated: {}",
        report.created().format("%Y-%m-%d %H:%M:%S")
    )?;
    if let (Some(left), Some(right)) = (report.left_root(), report.right_root()) {
        writeln!(out, "Left:  {}", left.display())?;
        writeln!(out, "Right: {}", right.display())?;
    }

    for result in report.results() {
        writeln!(out)?;
        writeln!(
            out,
            "--- {} vs {} ({} / {} lines)",
            result.left_path.display(),
            result.right_path.display(),
            result.left_lines,
            result.right_lines
        )?;
        for warning in &result.warnings {
            writeln!(out, "  Warning: {}", warning)?;
        }
        for entry in &result.diffs {
            write_entry(entry, out)?;
        }
        writeln!(out, "  {}", summary_text(result))?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Total: {} difference(s) across {} file pair(s)",
        report.total_diffs(),
        report.results().len()
    )?;
    Ok(())
}

fn write_entry<W: Write>(entry: &DiffEntry, out: &mut W) -> std::io::Result<()> {
    match entry.kind {
        ChangeKind::Update => {
            let changes: Vec<String> = entry
                .changes
                .iter()
                .map(|change| format!("{}: '{}' -> '{}'", change.field, change.left, change.right))
                .collect();
            writeln!(out, "  Update '{}': {}", entry.key, changes.join("; "))
        }
        ChangeKind::Add => writeln!(
            out,
            "  Add '{}' (row {})",
            entry.key,
            entry.right_row.unwrap_or(0)
        ),
        ChangeKind::Delete => writeln!(
            out,
            "  Delete '{}' (row {})",
            entry.key,
            entry.left_row.unwrap_or(0)
        ),
        ChangeKind::Move => writeln!(
            out,
            "  Move '{}': row {} -> row {}",
            entry.key,
            entry.left_row.unwrap_or(0),
            entry.right_row.unwrap_or(0)
        ),
        ChangeKind::Warning => Ok(()),
    }
}

fn summary_text(result: &DiffResult) -> String {
    if result.summary.is_empty() {
        return "No differences".to_string();
    }
    let parts: Vec<String> = result
        .summary
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind.plural()))
        .collect();
    format!("Summary: {}", parts.join(", "))
}
