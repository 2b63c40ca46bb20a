use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single option value as found in the options file or supplied at a call
/// site. Values are opaque to the resolution machinery and only interpreted
/// by whoever consumes the merged settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<SettingValue>),
    Map(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, SettingValue>> {
        match self {
            SettingValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Flatten a scalar or list value into its string forms. Nested lists
    /// are flattened; booleans and integers use their display form.
    pub fn to_string_list(&self) -> Vec<String> {
        match self {
            SettingValue::List(items) => items.iter().flat_map(|v| v.to_string_list()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(n) => write!(f, "{}", n),
            SettingValue::Str(s) => write!(f, "{}", s),
            SettingValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            SettingValue::Map(entries) => {
                let parts: Vec<String> = entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        SettingValue::Int(n)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(items: Vec<String>) -> Self {
        SettingValue::List(items.into_iter().map(SettingValue::Str).collect())
    }
}

/// An ordered bag of named option values with merge semantics.
///
/// Settings are layered: file defaults, then the matching file-type rule's
/// settings, then explicit call-site options, each layer winning over the
/// one below for any overlapping key. Keys are canonical lower-case
/// identifiers by the time they reach this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffSettings {
    values: BTreeMap<String, SettingValue>,
}

impl DiffSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.values.iter()
    }

    /// Return a copy of `self` with every key from `overrides` laid on top.
    pub fn merged_with(&self, overrides: &DiffSettings) -> DiffSettings {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            merged.values.insert(key.clone(), value.clone());
        }
        merged
    }

    fn bool_option(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(SettingValue::as_bool)
    }

    fn string_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(SettingValue::to_string_list)
    }

    // Well-known keys consumed inside the tool. Everything else passes
    // through the layers untouched.

    /// Glob selecting which left-side files take part in a directory diff.
    pub fn pattern(&self) -> Option<&str> {
        self.get("pattern").and_then(SettingValue::as_str)
    }

    /// Glob removed from the `pattern` expansion.
    pub fn exclude(&self) -> Option<&str> {
        self.get("exclude").and_then(SettingValue::as_str)
    }

    /// When true the file pair is skipped entirely (logged, not diffed).
    pub fn ignore(&self) -> bool {
        self.bool_option("ignore").unwrap_or(false)
    }

    /// Requested file-type names or patterns for a directory comparison.
    pub fn file_types(&self) -> Option<Vec<String>> {
        self.string_list("file_types")
    }

    /// Columns forming the row key, by header name or 0-based index.
    pub fn key_fields(&self) -> Option<Vec<String>> {
        self.string_list("key_fields")
    }

    /// Columns dropped from comparison, by header name or 0-based index.
    pub fn ignore_fields(&self) -> Option<Vec<String>> {
        self.string_list("ignore_fields")
    }

    pub fn case_sensitive(&self) -> bool {
        self.bool_option("case_sensitive").unwrap_or(true)
    }

    pub fn trim_whitespace(&self) -> bool {
        self.bool_option("trim_whitespace").unwrap_or(false)
    }

    pub fn ignore_adds(&self) -> bool {
        self.bool_option("ignore_adds").unwrap_or(false)
    }

    pub fn ignore_deletes(&self) -> bool {
        self.bool_option("ignore_deletes").unwrap_or(false)
    }

    pub fn ignore_updates(&self) -> bool {
        self.bool_option("ignore_updates").unwrap_or(false)
    }

    pub fn ignore_moves(&self) -> bool {
        self.bool_option("ignore_moves").unwrap_or(false)
    }

    /// Compact `key=value` rendering used in progress messages.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        parts.join(", ")
    }
}

impl FromIterator<(String, SettingValue)> for DiffSettings {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_win() {
        let mut base = DiffSettings::new();
        base.set("key_fields", vec!["id".to_string()]);
        base.set("case_sensitive", true);

        let mut top = DiffSettings::new();
        top.set("case_sensitive", false);

        let merged = base.merged_with(&top);
        assert_eq!(merged.key_fields(), Some(vec!["id".to_string()]));
        assert!(!merged.case_sensitive());
    }

    #[test]
    fn test_merge_is_not_symmetric() {
        let mut base = DiffSettings::new();
        base.set("pattern", "*.csv");

        let mut top = DiffSettings::new();
        top.set("pattern", "*.txt");

        assert_eq!(base.merged_with(&top).pattern(), Some("*.txt"));
        assert_eq!(top.merged_with(&base).pattern(), Some("*.csv"));
    }

    #[test]
    fn test_string_list_accepts_scalar_and_list() {
        let mut settings = DiffSettings::new();
        settings.set("file_types", "sales");
        assert_eq!(settings.file_types(), Some(vec!["sales".to_string()]));

        settings.set(
            "file_types",
            SettingValue::List(vec![
                SettingValue::Str("sales".to_string()),
                SettingValue::Str("inventory".to_string()),
            ]),
        );
        assert_eq!(
            settings.file_types(),
            Some(vec!["sales".to_string(), "inventory".to_string()])
        );
    }

    #[test]
    fn test_int_entries_render_as_strings() {
        let mut settings = DiffSettings::new();
        settings.set(
            "key_fields",
            SettingValue::List(vec![SettingValue::Int(0), SettingValue::Int(1)]),
        );
        assert_eq!(
            settings.key_fields(),
            Some(vec!["0".to_string(), "1".to_string()])
        );
    }

    #[test]
    fn test_defaults_for_missing_flags() {
        let settings = DiffSettings::new();
        assert!(settings.case_sensitive());
        assert!(!settings.trim_whitespace());
        assert!(!settings.ignore());
        assert!(!settings.ignore_adds());
        assert!(settings.pattern().is_none());
    }

    #[test]
    fn test_describe_renders_pairs() {
        let mut settings = DiffSettings::new();
        settings.set("ignore", true);
        settings.set("pattern", "*.csv");
        let described = settings.describe();
        assert!(described.contains("ignore=true"));
        assert!(described.contains("pattern=*.csv"));
    }
}
