use crate::source::{normalize_value, resolve_field_indices, CsvSource, SourceLine};
use csvdiff_common::{DiffSettings, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Classification of one keyed difference between two sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Key present only on the right side.
    Add,
    /// Key present only on the left side.
    Delete,
    /// Key present on both sides with differing field values.
    Update,
    /// Key present on both sides, fields equal, position among the shared
    /// keys changed.
    Move,
    /// Summary slot for accumulated warnings, never a diff entry.
    Warning,
}

impl ChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Add => "Add",
            ChangeKind::Delete => "Delete",
            ChangeKind::Update => "Update",
            ChangeKind::Move => "Move",
            ChangeKind::Warning => "Warning",
        }
    }

    /// Plural form used in summary lines.
    pub fn plural(&self) -> &'static str {
        match self {
            ChangeKind::Add => "Adds",
            ChangeKind::Delete => "Deletes",
            ChangeKind::Update => "Updates",
            ChangeKind::Move => "Moves",
            ChangeKind::Warning => "Warnings",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One changed field of an updated row, with the raw values of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub left: String,
    pub right: String,
}

/// One difference found for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub key: String,
    pub kind: ChangeKind,
    pub left_row: Option<usize>,
    pub right_row: Option<usize>,
    /// Changed fields, populated for `Update` entries only.
    pub changes: Vec<FieldChange>,
}

/// Everything the comparison of one file pair produced: the differences in
/// key order, the warnings of both sources plus the engine's own, and a
/// summary counting each change kind in first-occurrence order. Kinds with
/// a zero count never appear in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    pub left_lines: usize,
    pub right_lines: usize,
    pub diffs: Vec<DiffEntry>,
    pub warnings: Vec<String>,
    pub summary: Vec<(ChangeKind, usize)>,
}

impl DiffResult {
    pub fn diff_count(&self) -> usize {
        self.diffs.len()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.summary
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Keyed comparison engine for two delimited sources.
pub struct DiffEngine {
    settings: DiffSettings,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self {
            settings: DiffSettings::new(),
        }
    }

    pub fn with_settings(mut self, settings: DiffSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Open both files and compare them under the engine's settings.
    pub fn diff_files(&self, left: &Path, right: &Path) -> Result<DiffResult> {
        let left = CsvSource::load(left, &self.settings)?;
        let right = CsvSource::load(right, &self.settings)?;
        Ok(self.diff_sources(&left, &right))
    }

    /// Compare two already opened sources.
    pub fn diff_sources(&self, left: &CsvSource, right: &CsvSource) -> DiffResult {
        let mut warnings = Vec::new();
        warnings.extend(left.warnings.iter().cloned());
        warnings.extend(right.warnings.iter().cloned());
        if left.headers != right.headers {
            warnings.push(format!(
                "Column headers differ between {} and {}",
                left.path.display(),
                right.path.display()
            ));
        }

        let ignored: HashSet<usize> = match self.settings.ignore_fields() {
            Some(specs) => resolve_field_indices(
                &specs,
                &left.headers,
                &left.path,
                "ignore field",
                &mut warnings,
            )
            .into_iter()
            .collect(),
            None => HashSet::new(),
        };

        let left_map: HashMap<&str, &SourceLine> =
            left.lines.iter().map(|line| (line.key.as_str(), line)).collect();
        let right_map: HashMap<&str, &SourceLine> =
            right.lines.iter().map(|line| (line.key.as_str(), line)).collect();

        // Position of each shared key among the shared keys of its own
        // side. A pure add or delete shifts no ranks, a reorder does.
        let left_ranks = common_ranks(&left.lines, &right_map);
        let right_ranks = common_ranks(&right.lines, &left_map);

        let mut all_keys: Vec<&str> = left_map.keys().chain(right_map.keys()).copied().collect();
        all_keys.sort_unstable();
        all_keys.dedup();

        let trim = self.settings.trim_whitespace();
        let case_sensitive = self.settings.case_sensitive();
        let mut diffs = Vec::new();
        for key in all_keys {
            match (left_map.get(key), right_map.get(key)) {
                (Some(l), None) => {
                    if !self.settings.ignore_deletes() {
                        diffs.push(DiffEntry {
                            key: key.to_string(),
                            kind: ChangeKind::Delete,
                            left_row: Some(l.row),
                            right_row: None,
                            changes: Vec::new(),
                        });
                    }
                }
                (None, Some(r)) => {
                    if !self.settings.ignore_adds() {
                        diffs.push(DiffEntry {
                            key: key.to_string(),
                            kind: ChangeKind::Add,
                            left_row: None,
                            right_row: Some(r.row),
                            changes: Vec::new(),
                        });
                    }
                }
                (Some(l), Some(r)) => {
                    let changes =
                        changed_fields(&left.headers, l, r, &ignored, trim, case_sensitive);
                    if !changes.is_empty() {
                        if !self.settings.ignore_updates() {
                            diffs.push(DiffEntry {
                                key: key.to_string(),
                                kind: ChangeKind::Update,
                                left_row: Some(l.row),
                                right_row: Some(r.row),
                                changes,
                            });
                        }
                    } else if left_ranks.get(key) != right_ranks.get(key)
                        && !self.settings.ignore_moves()
                    {
                        diffs.push(DiffEntry {
                            key: key.to_string(),
                            kind: ChangeKind::Move,
                            left_row: Some(l.row),
                            right_row: Some(r.row),
                            changes: Vec::new(),
                        });
                    }
                }
                (None, None) => unreachable!(),
            }
        }
        debug!(
            "{} vs {}: {} difference(s), {} warning(s)",
            left.path.display(),
            right.path.display(),
            diffs.len(),
            warnings.len()
        );

        let summary = summarize(&diffs, warnings.len());
        DiffResult {
            left_path: left.path.clone(),
            right_path: right.path.clone(),
            left_lines: left.len(),
            right_lines: right.len(),
            diffs,
            warnings,
            summary,
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn common_ranks<'a>(
    lines: &'a [SourceLine],
    other: &HashMap<&str, &SourceLine>,
) -> HashMap<&'a str, usize> {
    lines
        .iter()
        .filter(|line| other.contains_key(line.key.as_str()))
        .enumerate()
        .map(|(rank, line)| (line.key.as_str(), rank))
        .collect()
}

fn changed_fields(
    headers: &[String],
    left: &SourceLine,
    right: &SourceLine,
    ignored: &HashSet<usize>,
    trim: bool,
    case_sensitive: bool,
) -> Vec<FieldChange> {
    let width = left.fields.len().max(right.fields.len());
    let mut changes = Vec::new();
    for index in 0..width {
        if ignored.contains(&index) {
            continue;
        }
        let left_value = left.fields.get(index).map(String::as_str).unwrap_or("");
        let right_value = right.fields.get(index).map(String::as_str).unwrap_or("");
        if normalize_value(left_value, trim, case_sensitive)
            != normalize_value(right_value, trim, case_sensitive)
        {
            let field = headers
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("column {}", index + 1));
            changes.push(FieldChange {
                field,
                left: left_value.to_string(),
                right: right_value.to_string(),
            });
        }
    }
    changes
}

/// Count each change kind in the order it first occurs, appending a
/// `Warning` slot when any warnings were collected.
fn summarize(diffs: &[DiffEntry], warning_count: usize) -> Vec<(ChangeKind, usize)> {
    let mut summary: Vec<(ChangeKind, usize)> = Vec::new();
    for entry in diffs {
        match summary.iter_mut().find(|(kind, _)| *kind == entry.kind) {
            Some((_, count)) => *count += 1,
            None => summary.push((entry.kind, 1)),
        }
    }
    if warning_count > 0 {
        summary.push((ChangeKind::Warning, warning_count));
    }
    summary
}
