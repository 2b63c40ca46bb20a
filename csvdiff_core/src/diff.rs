use crate::engine::DiffEngine;
use crate::file_types::{find_matching_file_types, resolve_settings_for_file, MatchCache};
use crate::options::{load_options, LoadedOptions};
use crate::pairing::pair_files;
use crate::report::DiffReport;
use csvdiff_common::{CsvDiffError, DiffSettings, ReportLine, Result, Severity};
use std::path::Path;
use tracing::debug;

impl DiffReport {
    /// Compare two paths and fold every produced result into the report.
    /// Two files are compared directly; two directories are paired up and
    /// compared pairwise. Any other combination of paths is an
    /// invalid-input error.
    pub fn diff(&mut self, left: &Path, right: &Path, options: &DiffSettings) -> Result<()> {
        if left.is_file() && right.is_file() {
            self.diff_file_pair(left, right, options)
        } else if left.is_dir() && right.is_dir() {
            self.diff_directories(left, right, options)
        } else {
            Err(CsvDiffError::InvalidInput(format!(
                "{} and {} must both be existing files or both be existing directories",
                left.display(),
                right.display()
            )))
        }
    }

    fn diff_file_pair(&mut self, left: &Path, right: &Path, options: &DiffSettings) -> Result<()> {
        let dir = containing_dir(left);
        let loaded = self.load_context(dir)?;
        let mut cache = MatchCache::new();
        self.diff_one(left, right, options, &loaded, &mut cache)
    }

    fn diff_directories(
        &mut self,
        left: &Path,
        right: &Path,
        options: &DiffSettings,
    ) -> Result<()> {
        let loaded = self.load_context(left)?;
        let mut cache = MatchCache::new();

        if let Some(requested) = options.file_types() {
            let matched = find_matching_file_types(&requested, &loaded, self.sink());
            debug!("Requested file types resolved to {:?}", matched);
            for name in matched {
                let Some(rule) = loaded.options.file_type(&name) else {
                    continue;
                };
                let Some(pattern) = rule.pattern.as_deref() else {
                    self.emit(&ReportLine::warning(format!(
                        "File type '{}' declares no pattern; nothing to compare",
                        name
                    )));
                    continue;
                };
                // The selected type's pattern and exclude drive the
                // pairing; its settings sit under the caller's options.
                let type_options = rule.settings.merged_with(options);
                let pairs = pair_files(
                    left,
                    right,
                    Some(pattern),
                    rule.exclude.as_deref(),
                    self.sink(),
                );
                debug!("File type '{}' paired {} file(s)", name, pairs.len());
                for pair in pairs {
                    self.diff_pair_lenient(&pair.left, &pair.right, &type_options, &loaded, &mut cache);
                }
            }
        } else {
            let pairs = pair_files(
                left,
                right,
                options.pattern(),
                options.exclude(),
                self.sink(),
            );
            for pair in pairs {
                self.diff_pair_lenient(&pair.left, &pair.right, options, &loaded, &mut cache);
            }
        }
        Ok(())
    }

    /// Directory runs keep going when one pair fails to compare; the
    /// failure degrades to a warning.
    fn diff_pair_lenient(
        &mut self,
        left: &Path,
        right: &Path,
        options: &DiffSettings,
        loaded: &LoadedOptions,
        cache: &mut MatchCache,
    ) {
        if let Err(e) = self.diff_one(left, right, options, loaded, cache) {
            self.emit(&ReportLine::warning(format!(
                "Failed to compare {}: {}",
                left.display(),
                e
            )));
        }
    }

    fn diff_one(
        &mut self,
        left: &Path,
        right: &Path,
        explicit: &DiffSettings,
        loaded: &LoadedOptions,
        cache: &mut MatchCache,
    ) -> Result<()> {
        let resolved = resolve_settings_for_file(left, loaded, cache, self.sink());
        let settings = resolved.merged_with(explicit);

        if settings.ignore() {
            debug!("Skipping {}: ignore is set", left.display());
            self.emit(
                &ReportLine::new()
                    .with_span("Ignoring ", Severity::Normal)
                    .with_span(left.display().to_string(), Severity::Info),
            );
            return Ok(());
        }

        let mut line = ReportLine::new()
            .with_span("Comparing ", Severity::Normal)
            .with_span(left.display().to_string(), Severity::Info)
            .with_span(" vs ", Severity::Normal)
            .with_span(right.display().to_string(), Severity::Info);
        if !settings.is_empty() {
            line.push(format!(" with {}", settings.describe()), Severity::Normal);
        }
        self.emit(&line);

        let result = DiffEngine::new()
            .with_settings(settings)
            .diff_files(left, right)?;
        self.emit(&ReportLine::plain(format!(
            "Read {} rows on the left, {} on the right",
            result.left_lines, result.right_lines
        )));
        self.add(result);
        Ok(())
    }

    fn load_context(&self, dir: &Path) -> Result<LoadedOptions> {
        let loaded = load_options(dir)?;
        if let Some(path) = &loaded.path {
            self.emit(
                &ReportLine::new()
                    .with_span("Using options from ", Severity::Normal)
                    .with_span(path.display().to_string(), Severity::Info),
            );
        }
        Ok(loaded)
    }
}

fn containing_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
