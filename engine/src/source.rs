//! Where rules come from. The registry only sees the [`RuleSource`] trait.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::rules::Rule;

pub trait RuleSource {
    fn load(&self) -> Result<Vec<Rule>, SourceError>;

    /// Human-readable origin for diagnostics.
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Parse rule text in the given format.
///
/// A document is either a bare list of rules or an object holding that list
/// under `rules` or `skills`.
pub fn parse_rules(text: &str, format: Format, origin: &str) -> Result<Vec<Rule>, SourceError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let shape = || SourceError::Shape { origin: origin.to_string() };
    match format {
        Format::Json => {
            let json_err = |source| SourceError::Json { origin: origin.to_string(), source };
            let list = match serde_json::from_str::<serde_json::Value>(text).map_err(json_err)? {
                list @ serde_json::Value::Array(_) => list,
                serde_json::Value::Object(mut map) => {
                    map.remove("rules").or_else(|| map.remove("skills")).ok_or_else(shape)?
                }
                _ => return Err(shape()),
            };
            serde_json::from_value(list).map_err(json_err)
        }
        Format::Yaml => {
            let yaml_err = |source| SourceError::Yaml { origin: origin.to_string(), source };
            let list = match serde_yaml::from_str::<serde_yaml::Value>(text).map_err(yaml_err)? {
                list @ serde_yaml::Value::Sequence(_) => list,
                serde_yaml::Value::Mapping(mut map) => {
                    map.remove("rules").or_else(|| map.remove("skills")).ok_or_else(shape)?
                }
                _ => return Err(shape()),
            };
            serde_yaml::from_value(list).map_err(yaml_err)
        }
    }
}

/// Rules already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub label: String,
    pub rules: Vec<Rule>,
}

impl MemorySource {
    pub fn new(label: &str, rules: Vec<Rule>) -> Self {
        Self { label: label.to_string(), rules }
    }
}

impl RuleSource for MemorySource {
    fn load(&self) -> Result<Vec<Rule>, SourceError> {
        Ok(self.rules.clone())
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}

/// Rule text held in memory (embedded content, test fixtures).
#[derive(Debug, Clone)]
pub struct TextSource {
    pub label: String,
    pub text: String,
    pub format: Format,
}

impl TextSource {
    pub fn new(label: &str, text: impl Into<String>, format: Format) -> Self {
        Self { label: label.to_string(), text: text.into(), format }
    }

    pub fn json(label: &str, text: impl Into<String>) -> Self {
        Self::new(label, text, Format::Json)
    }

    pub fn yaml(label: &str, text: impl Into<String>) -> Self {
        Self::new(label, text, Format::Yaml)
    }
}

impl RuleSource for TextSource {
    fn load(&self) -> Result<Vec<Rule>, SourceError> {
        parse_rules(&self.text, self.format, &self.label)
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}

/// A rule file on disk; the format comes from the extension.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RuleSource for FileSource {
    fn load(&self) -> Result<Vec<Rule>, SourceError> {
        let origin = self.name();
        let format = Format::from_path(&self.path).ok_or_else(|| SourceError::UnknownFormat(origin.clone()))?;
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Io { path: origin.clone(), source })?;
        parse_rules(&text, format, &origin)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}
