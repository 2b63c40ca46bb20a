mod excel;
mod html;
mod text;

pub use excel::ExcelRenderer;
pub use html::HtmlRenderer;
pub use text::TextRenderer;

use crate::report::DiffReport;
use csvdiff_common::{CsvDiffError, Result};
use std::fmt;
use std::path::Path;

/// The closed set of report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Excel,
    Html,
    Text,
}

impl ReportFormat {
    /// Explicit format tokens: `xlsx`/`xls`, `html`, `text`/`txt`/`csv`,
    /// case-insensitive.
    fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "xlsx" | "xls" => Some(ReportFormat::Excel),
            "html" => Some(ReportFormat::Html),
            "text" | "txt" | "csv" => Some(ReportFormat::Text),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| Self::from_token(&ext.to_string_lossy()))
    }

    /// Resolve the output format: a recognized explicit token wins, the
    /// path's extension is the fallback. When neither names a known
    /// format the request is unsupported.
    pub fn resolve(token: Option<&str>, path: &Path) -> Result<Self> {
        token
            .and_then(Self::from_token)
            .or_else(|| Self::from_path(path))
            .ok_or_else(|| {
                CsvDiffError::UnsupportedFormat(
                    token
                        .map(str::to_string)
                        .unwrap_or_else(|| path.display().to_string()),
                )
            })
    }

    pub fn renderer(&self) -> Box<dyn ReportRenderer> {
        match self {
            ReportFormat::Excel => Box::new(ExcelRenderer),
            ReportFormat::Html => Box::new(HtmlRenderer),
            ReportFormat::Text => Box::new(TextRenderer),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Excel => "excel",
            ReportFormat::Html => "html",
            ReportFormat::Text => "text",
        };
        write!(f, "{}", name)
    }
}

/// Capability interface every output format implements.
pub trait ReportRenderer {
    fn render(&self, report: &DiffReport, path: &Path) -> Result<()>;
}
