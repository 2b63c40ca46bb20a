use csvdiff_common::{ReportLine, ReportSink};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pattern used when the caller supplies none: every file directly inside
/// the left root. Traversal depth is governed entirely by the glob, there
/// is no implicit recursive walk.
pub const DEFAULT_PATTERN: &str = "*";

/// One left/right file pair resolved for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub left: PathBuf,
    pub right: PathBuf,
}

/// Expand `pattern` under the left root, drop anything the `exclude`
/// expansion also names, and pair each remaining file with the same base
/// filename under the right root. Left files are visited in sorted order;
/// a left file with no right-side counterpart is warned about and skipped.
pub fn pair_files(
    left_root: &Path,
    right_root: &Path,
    pattern: Option<&str>,
    exclude: Option<&str>,
    sink: &dyn ReportSink,
) -> Vec<FilePair> {
    let pattern = pattern.unwrap_or(DEFAULT_PATTERN);
    let mut lefts = expand_files(left_root, pattern, sink);

    if let Some(exclude) = exclude {
        let excluded: BTreeSet<PathBuf> = expand_files(left_root, exclude, sink).into_iter().collect();
        lefts.retain(|path| !excluded.contains(path));
    }
    lefts.sort();
    debug!(
        "Pattern '{}' selected {} file(s) under {}",
        pattern,
        lefts.len(),
        left_root.display()
    );

    let mut pairs = Vec::with_capacity(lefts.len());
    for left in lefts {
        let Some(name) = left.file_name() else {
            continue;
        };
        let right = right_root.join(name);
        if right.is_file() {
            pairs.push(FilePair { left, right });
        } else {
            sink.emit(&ReportLine::warning(format!(
                "Skipping {}: no corresponding file on the other side",
                left.display()
            )));
        }
    }
    pairs
}

fn expand_files(root: &Path, pattern: &str, sink: &dyn ReportSink) -> Vec<PathBuf> {
    let full = root.join(pattern);
    match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(std::result::Result::ok)
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            sink.emit(&ReportLine::warning(format!(
                "Invalid pattern '{}': {}",
                pattern, e
            )));
            Vec::new()
        }
    }
}
