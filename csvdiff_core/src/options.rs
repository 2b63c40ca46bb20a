use csvdiff_common::{CsvDiffError, DiffSettings, Result, SettingValue};
use serde_yml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OPTIONS_FILE_NAME: &str = ".csvdiff";

/// Parsed options file with every key already normalized to its canonical
/// lower-case identifier form.
#[derive(Debug, Clone, Default)]
pub struct OptionsFile {
    /// Options applied to every comparison unless overridden.
    pub defaults: DiffSettings,
    /// File-type rules in declaration order. Order matters: the first rule
    /// whose pattern matches a file wins.
    pub file_types: Vec<FileTypeRule>,
}

impl OptionsFile {
    pub fn has_file_types(&self) -> bool {
        !self.file_types.is_empty()
    }

    pub fn file_type(&self, name: &str) -> Option<&FileTypeRule> {
        self.file_types.iter().find(|rule| rule.name == name)
    }
}

/// One declared file type: a required inclusion glob, an optional exclusion
/// glob, and any further options merged into comparisons of matching files.
#[derive(Debug, Clone, Default)]
pub struct FileTypeRule {
    pub name: String,
    pub pattern: Option<String>,
    pub exclude: Option<String>,
    pub settings: DiffSettings,
}

/// Outcome of looking for an options file. `path` is `None` when no file
/// was found in either search location.
#[derive(Debug, Clone, Default)]
pub struct LoadedOptions {
    pub options: OptionsFile,
    pub path: Option<PathBuf>,
}

impl LoadedOptions {
    pub fn exists(&self) -> bool {
        self.path.is_some()
    }
}

/// Load the options file for a comparison rooted at `dir`. The file in
/// `dir` wins, the current working directory is the fallback, and a missing
/// file yields empty options rather than an error.
pub fn load_options(dir: &Path) -> Result<LoadedOptions> {
    let cwd = std::env::current_dir().ok();
    let Some(path) = locate(dir, cwd.as_deref()) else {
        debug!("No {} found for {}", OPTIONS_FILE_NAME, dir.display());
        return Ok(LoadedOptions::default());
    };

    let data = fs::read_to_string(&path)?;
    let value: Value = serde_yml::from_str(&data)
        .map_err(|e| CsvDiffError::Config(format!("{}: {}", path.display(), e)))?;
    let options = parse_options(&path, value)?;
    debug!("Loaded options from {}", path.display());

    Ok(LoadedOptions {
        options,
        path: Some(path),
    })
}

fn locate(dir: &Path, cwd: Option<&Path>) -> Option<PathBuf> {
    let local = dir.join(OPTIONS_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let fallback = cwd?.join(OPTIONS_FILE_NAME);
    fallback.is_file().then_some(fallback)
}

fn parse_options(path: &Path, value: Value) -> Result<OptionsFile> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(OptionsFile::default()),
        other => {
            return Err(CsvDiffError::Config(format!(
                "{}: expected a mapping at the top level, found {}",
                path.display(),
                value_kind(&other)
            )))
        }
    };

    let mut options = OptionsFile::default();
    for (key, value) in mapping {
        let key = normalize_key(&key);
        match key.as_str() {
            "defaults" => options.defaults = settings_section(path, &key, value)?,
            "file_types" => options.file_types = rules_section(path, value)?,
            other => debug!("Ignoring unrecognized section '{}' in {}", other, path.display()),
        }
    }
    Ok(options)
}

fn settings_section(path: &Path, section: &str, value: Value) -> Result<DiffSettings> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(DiffSettings::new()),
        other => {
            return Err(CsvDiffError::Config(format!(
                "{}: '{}' must be a mapping, found {}",
                path.display(),
                section,
                value_kind(&other)
            )))
        }
    };

    let mut settings = DiffSettings::new();
    for (key, value) in mapping {
        let key = normalize_key(&key);
        if let Some(converted) = setting_from(value) {
            settings.set(key, converted);
        }
    }
    Ok(settings)
}

fn rules_section(path: &Path, value: Value) -> Result<Vec<FileTypeRule>> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(CsvDiffError::Config(format!(
                "{}: 'file_types' must be a mapping of type name to rule, found {}",
                path.display(),
                value_kind(&other)
            )))
        }
    };

    Ok(mapping
        .into_iter()
        .map(|(name, value)| rule_from(normalize_key(&name), value))
        .collect())
}

fn rule_from(name: String, value: Value) -> FileTypeRule {
    let Value::Mapping(mapping) = value else {
        // A rule must be a mapping. Anything else has no pattern, so it can
        // never match; resolution warns about it then.
        return FileTypeRule {
            name,
            ..Default::default()
        };
    };

    let mut rule = FileTypeRule {
        name,
        ..Default::default()
    };
    for (key, value) in mapping {
        let key = normalize_key(&key);
        let Some(converted) = setting_from(value) else {
            continue;
        };
        if key == "pattern" {
            rule.pattern = string_value(converted);
        } else if key == "exclude" {
            rule.exclude = string_value(converted);
        } else {
            rule.settings.set(key, converted);
        }
    }
    rule
}

fn string_value(value: SettingValue) -> Option<String> {
    match value {
        SettingValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Canonical identifier form of a key or file-type name: lower-case,
/// whitespace runs collapsed to a single underscore.
pub fn normalize_name(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn normalize_key(key: &Value) -> String {
    normalize_name(&key_text(key))
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn setting_from(value: Value) -> Option<SettingValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(SettingValue::Bool(b)),
        Value::Number(n) => Some(
            n.as_i64()
                .map(SettingValue::Int)
                .unwrap_or_else(|| SettingValue::Str(n.to_string())),
        ),
        Value::String(s) => Some(SettingValue::Str(s)),
        Value::Sequence(items) => Some(SettingValue::List(
            items.into_iter().filter_map(setting_from).collect(),
        )),
        Value::Mapping(mapping) => Some(SettingValue::Map(
            mapping
                .into_iter()
                .filter_map(|(key, value)| {
                    let key = normalize_key(&key);
                    setting_from(value).map(|converted| (key, converted))
                })
                .collect(),
        )),
        Value::Tagged(tagged) => setting_from(tagged.value),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
