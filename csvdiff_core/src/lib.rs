pub mod options;
pub mod file_types;
pub mod pairing;
pub mod source;
pub mod engine;
pub mod report;
pub mod render;
pub mod diff;

pub use options::{load_options, FileTypeRule, LoadedOptions, OptionsFile, OPTIONS_FILE_NAME};
pub use file_types::{find_matching_file_types, resolve_settings_for_file, MatchCache};
pub use pairing::{pair_files, FilePair, DEFAULT_PATTERN};
pub use source::{CsvSource, SourceLine};
pub use engine::{ChangeKind, DiffEngine, DiffEntry, DiffResult, FieldChange};
pub use report::DiffReport;
pub use render::{ReportFormat, ReportRenderer};
