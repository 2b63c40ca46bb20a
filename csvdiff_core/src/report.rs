use crate::engine::{ChangeKind, DiffResult};
use crate::render::ReportFormat;
use chrono::{DateTime, Local};
use csvdiff_common::{ConsoleSink, ReportLine, ReportSink, Result, Severity};
use std::path::{Path, PathBuf};
use tracing::info;

/// Accumulated comparison report: every diff result in the order it was
/// added, the roots of the first comparison, and the sink progress lines
/// are written to.
pub struct DiffReport {
    results: Vec<DiffResult>,
    left_root: Option<PathBuf>,
    right_root: Option<PathBuf>,
    created: DateTime<Local>,
    sink: Box<dyn ReportSink>,
}

impl DiffReport {
    /// An empty report writing progress to the console.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            left_root: None,
            right_root: None,
            created: Local::now(),
            sink: Box::new(ConsoleSink),
        }
    }

    /// Replace the default console sink.
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Fold one diff result into the report. The first result fixes the
    /// report's left/right roots; later results leave them untouched. The
    /// result's warnings are emitted first, then its one-line summary.
    pub fn add(&mut self, result: DiffResult) {
        if self.left_root.is_none() {
            self.left_root = Some(result.left_path.clone());
            self.right_root = Some(result.right_path.clone());
        }

        for warning in &result.warnings {
            self.sink.emit(&ReportLine::warning(warning.clone()));
        }
        self.sink.emit(&summary_line(&result));
        self.results.push(result);
    }

    /// Render the report to `path`. The format comes from the explicit
    /// token when it names a known format, from the path's extension
    /// otherwise; when neither matches this is an unsupported-format error.
    pub fn output(&self, path: &Path, format: Option<&str>) -> Result<()> {
        let format = ReportFormat::resolve(format, path)?;
        info!("Writing {} report to {}", format, path.display());
        format.renderer().render(self, path)?;

        self.sink.emit(
            &ReportLine::new()
                .with_span("Report saved to ", Severity::Normal)
                .with_span(path.display().to_string(), Severity::Info),
        );
        Ok(())
    }

    pub fn results(&self) -> &[DiffResult] {
        &self.results
    }

    pub fn left_root(&self) -> Option<&Path> {
        self.left_root.as_deref()
    }

    pub fn right_root(&self) -> Option<&Path> {
        self.right_root.as_deref()
    }

    pub fn created(&self) -> DateTime<Local> {
        self.created
    }

    /// Total number of differences across all results.
    pub fn total_diffs(&self) -> usize {
        self.results.iter().map(DiffResult::diff_count).sum()
    }

    pub(crate) fn emit(&self, line: &ReportLine) {
        self.sink.emit(line);
    }

    pub(crate) fn sink(&self) -> &dyn ReportSink {
        self.sink.as_ref()
    }
}

impl Default for DiffReport {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-result summary line: "Found N differences: 1 Updates, 2 Adds",
/// categories in the result's own first-occurrence order, zero counts
/// absent, each count highlighted.
fn summary_line(result: &DiffResult) -> ReportLine {
    let mut line = ReportLine::new().with_span(
        format!("Found {} differences", result.diff_count()),
        Severity::Normal,
    );
    for (index, (kind, count)) in result.summary.iter().enumerate() {
        let separator = if index == 0 { ": " } else { ", " };
        line.push(separator, Severity::Normal);
        let severity = match kind {
            ChangeKind::Warning => Severity::Warning,
            _ => Severity::Info,
        };
        line.push(format!("{} {}", count, kind.plural()), severity);
    }
    line
}
