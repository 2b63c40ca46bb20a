use csv::ReaderBuilder;
use csvdiff_common::{CsvDiffError, DiffSettings, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One data row of an opened source: its comparison key, its 1-indexed
/// position in the file, and the raw field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub key: String,
    pub row: usize,
    pub fields: Vec<String>,
}

/// A delimited file opened for comparison. The first record is the header
/// row; every following record becomes a keyed line. Rows whose key was
/// already seen are dropped with a warning, the first occurrence wins.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub key_indices: Vec<usize>,
    pub lines: Vec<SourceLine>,
    pub warnings: Vec<String>,
}

impl CsvSource {
    /// Open `path` and read it fully. `key_fields` in the settings selects
    /// the key columns by header name or 0-based index; the first column
    /// is the key when nothing is configured.
    pub fn load(path: &Path, settings: &DiffSettings) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| CsvDiffError::Parse(format!("Failed to open {}: {}", path.display(), e)))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| {
                CsvDiffError::Parse(format!(
                    "Failed to read headers of {}: {}",
                    path.display(),
                    e
                ))
            })?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut warnings = Vec::new();
        let key_indices = match settings.key_fields() {
            Some(specs) => {
                let mut indices =
                    resolve_field_indices(&specs, &headers, path, "key field", &mut warnings);
                if indices.is_empty() && !headers.is_empty() {
                    warnings.push(format!(
                        "No usable key field in {}; falling back to the first column",
                        path.display()
                    ));
                    indices = vec![0];
                }
                indices
            }
            None if headers.is_empty() => Vec::new(),
            None => vec![0],
        };

        let trim = settings.trim_whitespace();
        let case_sensitive = settings.case_sensitive();

        let mut lines = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut row = 0;
        for record in reader.records() {
            row += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warnings.push(format!(
                        "Skipping malformed row {} of {}: {}",
                        row,
                        path.display(),
                        e
                    ));
                    continue;
                }
            };

            let key = key_indices
                .iter()
                .map(|&index| normalize_value(record.get(index).unwrap_or(""), trim, case_sensitive))
                .collect::<Vec<_>>()
                .join("|");
            if !seen.insert(key.clone()) {
                warnings.push(format!(
                    "Duplicate key '{}' at row {} of {}; keeping the first occurrence",
                    key,
                    row,
                    path.display()
                ));
                continue;
            }

            lines.push(SourceLine {
                key,
                row,
                fields: record.iter().map(|s| s.to_string()).collect(),
            });
        }
        debug!("Read {} line(s) from {}", lines.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            key_indices,
            lines,
            warnings,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Resolve a list of column selectors (header names, case-insensitive, or
/// 0-based indices) to column indices, warning about anything unknown.
pub(crate) fn resolve_field_indices(
    specs: &[String],
    headers: &[String],
    path: &Path,
    label: &str,
    warnings: &mut Vec<String>,
) -> Vec<usize> {
    let mut indices = Vec::new();
    for spec in specs {
        let spec = spec.trim();
        let found = if let Ok(index) = spec.parse::<usize>() {
            (index < headers.len()).then_some(index)
        } else {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(spec))
        };
        match found {
            Some(index) if !indices.contains(&index) => indices.push(index),
            Some(_) => {}
            None => warnings.push(format!(
                "Unknown {} '{}' in {}; ignoring it",
                label,
                spec,
                path.display()
            )),
        }
    }
    indices
}

/// Comparison-time view of a field value under the active options.
pub(crate) fn normalize_value(raw: &str, trim: bool, case_sensitive: bool) -> String {
    let value = if trim { raw.trim() } else { raw };
    if case_sensitive {
        value.to_string()
    } else {
        value.to_lowercase()
    }
}
