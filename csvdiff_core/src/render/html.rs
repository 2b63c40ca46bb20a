use crate::engine::{ChangeKind, DiffEntry, DiffResult};
use crate::render::ReportRenderer;
use crate::report::DiffReport;
use csvdiff_common::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Self-contained HTML renderer: one document, embedded styles, one table
/// per compared file pair.
pub struct HtmlRenderer;

impl ReportRenderer for HtmlRenderer {
    fn render(&self, report: &DiffReport, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_report(report, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }\n\
table { border-collapse: collapse; margin: 1em 0; }\n\
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }\n\
th { background: #f0f0f0; }\n\
tr.add td { background: #e6ffe6; }\n\
tr.delete td { background: #ffe6e6; }\n\
tr.update td { background: #fff8e0; }\n\
tr.move td { background: #e6f0ff; }\n\
p.warning { color: #a06000; }\n";

pub(crate) fn write_report<W: Write>(report: &DiffReport, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html><head><meta charset=\"utf-8\">")?;
    writeln!(out, "<title>CSV Diff Report</title>")?;
    writeln!(out, "<style>\n{}</style>", STYLE)?;
    writeln!(out, "</head><body>")?;
    writeln!(out, "<h1>CSV Diff Report</h1>")?;
    writeln!(
        out,
        "<p>Generated: {}</p>",
        report.created().format("%Y-%m-%d %H:%M:%S")
    )?;
    if let (Some(left), Some(right)) = (report.left_root(), report.right_root()) {
        writeln!(
            out,
            "<p>Left: <code>{}</code><br>Right: <code>{}</code></p>",
            escape(&left.display().to_string()),
            escape(&right.display().to_string())
        )?;
    }

    for result in report.results() {
        write_result(result, out)?;
    }

    writeln!(
        out,
        "<p><strong>Total: {} difference(s) across {} file pair(s)</strong></p>",
        report.total_diffs(),
        report.results().len()
    )?;
    writeln!(out, "</body></html>")?;
    Ok(())
}

fn write_result<W: Write>(result: &DiffResult, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "<h2>{} vs {}</h2>",
        escape(&result.left_path.display().to_string()),
        escape(&result.right_path.display().to_string())
    )?;
    writeln!(
        out,
        "<p>{} / {} lines, {}</p>",
        result.left_lines,
        result.right_lines,
        escape(&summary_text(result))
    )?;
    for warning in &result.warnings {
        writeln!(out, "<p class=\"warning\">Warning: {}</p>", escape(warning))?;
    }

    if result.diffs.is_empty() {
        return Ok(());
    }
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Key</th><th>Change</th><th>Field</th><th>Left</th><th>Right</th></tr>"
    )?;
    for entry in &result.diffs {
        write_entry(entry, out)?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn write_entry<W: Write>(entry: &DiffEntry, out: &mut W) -> std::io::Result<()> {
    let class = entry.kind.label().to_lowercase();
    match entry.kind {
        ChangeKind::Update => {
            for change in &entry.changes {
                writeln!(
                    out,
                    "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    class,
                    escape(&entry.key),
                    entry.kind.label(),
                    escape(&change.field),
                    escape(&change.left),
                    escape(&change.right)
                )?;
            }
            Ok(())
        }
        ChangeKind::Add => writeln!(
            out,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td></td><td></td><td>row {}</td></tr>",
            class,
            escape(&entry.key),
            entry.kind.label(),
            entry.right_row.unwrap_or(0)
        ),
        ChangeKind::Delete => writeln!(
            out,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td></td><td>row {}</td><td></td></tr>",
            class,
            escape(&entry.key),
            entry.kind.label(),
            entry.left_row.unwrap_or(0)
        ),
        ChangeKind::Move => writeln!(
            out,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td></td><td>row {}</td><td>row {}</td></tr>",
            class,
            escape(&entry.key),
            entry.kind.label(),
            entry.left_row.unwrap_or(0),
            entry.right_row.unwrap_or(0)
        ),
        ChangeKind::Warning => Ok(()),
    }
}

fn summary_text(result: &DiffResult) -> String {
    if result.summary.is_empty() {
        return "no differences".to_string();
    }
    let parts: Vec<String> = result
        .summary
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind.plural()))
        .collect();
    parts.join(", ")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
