use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Semantic category of a span of report text. Sinks decide how (or
/// whether) to render each category; the core never emits color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Info,
}

/// One contiguous run of text sharing a severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub severity: Severity,
}

impl Span {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// A single progress or report message, as an ordered list of spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub spans: Vec<Span>,
}

impl ReportLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-span line with `Normal` severity.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().with_span(text, Severity::Normal)
    }

    /// A one-span line with `Warning` severity.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new().with_span(text, Severity::Warning)
    }

    pub fn with_span(mut self, text: impl Into<String>, severity: Severity) -> Self {
        self.spans.push(Span::new(text, severity));
        self
    }

    pub fn push(&mut self, text: impl Into<String>, severity: Severity) {
        self.spans.push(Span::new(text, severity));
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The line's text with severities stripped.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// True if any span carries `Warning` severity.
    pub fn has_warning(&self) -> bool {
        self.spans.iter().any(|s| s.severity == Severity::Warning)
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Receiver for progress and report lines. Implementations own the
/// presentation; callers only hand over structured lines.
pub trait ReportSink: Send + Sync {
    fn emit(&self, line: &ReportLine);
}

/// Default sink: plain text to stdout, one blank line after each message.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn emit(&self, line: &ReportLine) {
        println!("{}", line.text());
        println!();
    }
}

/// Sink that records every line, for tests and for callers that render the
/// report after the run completes. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<ReportLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines recorded so far.
    pub fn lines(&self) -> Vec<ReportLine> {
        if let Ok(guard) = self.lines.lock() {
            guard.clone()
        } else {
            Vec::new()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, line: &ReportLine) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(line.clone());
        }
    }
}
