use crate::options::{normalize_name, FileTypeRule, LoadedOptions, OPTIONS_FILE_NAME};
use csvdiff_common::{DiffSettings, ReportLine, ReportSink};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cache of resolved `pattern` minus `exclude` expansions, one entry per
/// rule and directory. Scoped to a single top-level diff run; create it
/// fresh per run and drop it afterwards.
#[derive(Debug, Default)]
pub struct MatchCache {
    matches: HashMap<(usize, PathBuf), BTreeSet<PathBuf>>,
    warned_missing_pattern: HashSet<usize>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The files the rule matches under `dir`. Computed on first use,
    /// served from the cache afterwards. A rule without a pattern matches
    /// nothing and is warned about once per run, not once per lookup.
    pub fn matched_files(
        &mut self,
        index: usize,
        rule: &FileTypeRule,
        dir: &Path,
        sink: &dyn ReportSink,
    ) -> &BTreeSet<PathBuf> {
        let key = (index, dir.to_path_buf());
        if !self.matches.contains_key(&key) {
            let matched = self.expand_rule(index, rule, dir, sink);
            debug!(
                "File type '{}' matched {} file(s) under {}",
                rule.name,
                matched.len(),
                dir.display()
            );
            self.matches.insert(key.clone(), matched);
        }
        self.matches.entry(key).or_default()
    }

    fn expand_rule(
        &mut self,
        index: usize,
        rule: &FileTypeRule,
        dir: &Path,
        sink: &dyn ReportSink,
    ) -> BTreeSet<PathBuf> {
        let Some(pattern) = rule.pattern.as_deref() else {
            if self.warned_missing_pattern.insert(index) {
                sink.emit(&ReportLine::warning(format!(
                    "File type '{}' has no pattern and will never match any file",
                    rule.name
                )));
            }
            return BTreeSet::new();
        };

        let mut matched = expand_glob(dir, pattern, &rule.name, sink);
        if let Some(exclude) = rule.exclude.as_deref() {
            for path in expand_glob(dir, exclude, &rule.name, sink) {
                matched.remove(&path);
            }
        }
        matched
    }
}

/// Resolve the file-type names declared in the options that match any of
/// the requested names or patterns. Requests support `*` (any sequence),
/// `?` and `.` (single character). Unmatched requests warn and are
/// dropped; the result keeps declaration order and carries no duplicates.
pub fn find_matching_file_types(
    requested: &[String],
    loaded: &LoadedOptions,
    sink: &dyn ReportSink,
) -> Vec<String> {
    let rules = &loaded.options.file_types;
    let mut selected = vec![false; rules.len()];

    for request in requested {
        let mut hit = false;
        if let Some(matcher) = name_pattern(request) {
            for (index, rule) in rules.iter().enumerate() {
                if matcher.is_match(&rule.name) {
                    selected[index] = true;
                    hit = true;
                }
            }
        }
        if !hit {
            let reason = if !loaded.exists() {
                format!("no {} options file was found", OPTIONS_FILE_NAME)
            } else if rules.is_empty() {
                "the options file declares no file_types".to_string()
            } else {
                "it matches no declared file type".to_string()
            };
            sink.emit(&ReportLine::warning(format!(
                "Ignoring file type '{}': {}",
                request, reason
            )));
        }
    }

    rules
        .iter()
        .zip(selected)
        .filter(|(_, selected)| *selected)
        .map(|(rule, _)| rule.name.clone())
        .collect()
}

/// Merge the settings that apply to one concrete file: `defaults`, then
/// the first declared rule whose expansion contains the file. Later rules
/// are never consulted once a rule has matched.
pub fn resolve_settings_for_file(
    file: &Path,
    loaded: &LoadedOptions,
    cache: &mut MatchCache,
    sink: &dyn ReportSink,
) -> DiffSettings {
    let defaults = loaded.options.defaults.clone();
    let dir = file_dir(file);
    let probe = canonical(file);

    for (index, rule) in loaded.options.file_types.iter().enumerate() {
        if cache.matched_files(index, rule, &dir, sink).contains(&probe) {
            debug!(
                "File {} resolved to file type '{}'",
                file.display(),
                rule.name
            );
            return defaults.merged_with(&rule.settings);
        }
    }
    defaults
}

fn file_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn expand_glob(dir: &Path, pattern: &str, rule: &str, sink: &dyn ReportSink) -> BTreeSet<PathBuf> {
    let full = dir.join(pattern);
    match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(std::result::Result::ok)
            .filter(|path| path.is_file())
            .map(|path| canonical(&path))
            .collect(),
        Err(e) => {
            sink.emit(&ReportLine::warning(format!(
                "File type '{}': invalid pattern '{}': {}",
                rule, pattern, e
            )));
            BTreeSet::new()
        }
    }
}

/// Requested names match declared names through an anchored,
/// case-insensitive translation: `*` spans any sequence while `?` and `.`
/// each span a single character, so `*.csv` matches the declared name
/// `sales_csv`.
fn name_pattern(request: &str) -> Option<Regex> {
    let normalized = normalize_name(request);
    let mut pattern = String::from("(?i)^");
    for ch in normalized.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' | '.' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
