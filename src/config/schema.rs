//! Configuration schema types for `mappings.toml`
//!
//! Defines the structure and validation rules for mapping project configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::artifact::{Dependency, Platform};
use crate::entry::{OBFUSCATED, OFFICIAL};
use crate::format::{MappingFormat, ParameterDocs};

/// Project-wide settings section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Platform whose sides the official entry reads
    #[serde(default)]
    pub platform: Platform,
    /// Advisory cache slots per entry (0 disables caching)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Number of parallel decode/download workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Local Maven-layout repositories searched for coordinates
    #[serde(default)]
    pub repositories: Vec<PathBuf>,
    /// Version descriptor JSON used by the official entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<PathBuf>,
    /// Artifact cache root
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            cache_capacity: default_cache_capacity(),
            jobs: None,
            repositories: Vec::new(),
            version: None,
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_cache_capacity() -> usize {
    crate::entry::cache::DEFAULT_CAPACITY
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".mapchain")
}

/// One `[entries.<name>]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Format name (`fart`, `proguard`, `xsrg`, `tsrg`, `namespaced`, `tiny`, `parchment`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Dependency notation: `group:name:version[:classifier][@ext]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
    /// File dependency globs, relative to the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PathBuf>>,
    /// Entry this one is layered on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Reverse the decoded table
    #[serde(default)]
    pub inverse: bool,
    /// Source namespace of a multi-namespace file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Target namespace of a multi-namespace file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Parchment parameter documentation policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_docs: Option<ParameterDocs>,
}

impl EntryConfig {
    /// The configured format, with Parchment's documentation policy applied.
    pub fn mapping_format(&self) -> Option<MappingFormat> {
        let format = MappingFormat::from_name(self.format.as_deref()?)?;
        Some(match (format, self.parameter_docs) {
            (MappingFormat::Parchment(_), Some(docs)) => MappingFormat::Parchment(docs),
            (format, _) => format,
        })
    }

    /// The configured dependency, if any.
    ///
    /// `files` wins over `dependency`; declaring both is a validation error.
    pub fn mapping_dependency(&self) -> Option<Result<Dependency, String>> {
        if let Some(files) = &self.files {
            return Some(Ok(Dependency::Files(files.clone())));
        }
        self.dependency.as_deref().map(|notation| Dependency::parse(notation).map_err(|e| e.to_string()))
    }
}

/// Root configuration structure for `mappings.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingsConfig {
    /// Project-wide settings
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Mapping entries by name
    #[serde(default)]
    pub entries: BTreeMap<String, EntryConfig>,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "entries.yarn.format")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mappings.toml: '{}' {}", self.field, self.message)
    }
}

fn problem(field: String, message: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError { field, message: message.into() }
}

impl MappingsConfig {
    /// Validate the configuration and return any errors
    ///
    /// Parent references and cycles are checked once the entries are
    /// registered, since they span entries.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.settings.jobs == Some(0) {
            errors.push(problem("settings.jobs".to_string(), "must be a positive integer"));
        }

        for (name, entry) in &self.entries {
            if name == OBFUSCATED || name == OFFICIAL {
                errors.push(problem(
                    format!("entries.{name}"),
                    "is a built-in entry and cannot be redeclared",
                ));
            }

            match entry.format.as_deref() {
                None => errors.push(problem(format!("entries.{name}.format"), "is required")),
                Some(format) if MappingFormat::from_name(format).is_none() => {
                    errors.push(problem(
                        format!("entries.{name}.format"),
                        format!("names an unknown format '{format}'"),
                    ));
                }
                Some(_) => {}
            }

            if entry.parameter_docs.is_some()
                && !matches!(entry.mapping_format(), Some(MappingFormat::Parchment(_)))
            {
                errors.push(problem(
                    format!("entries.{name}.parameter_docs"),
                    "only applies to the parchment format",
                ));
            }

            match (&entry.dependency, &entry.files) {
                (Some(_), Some(_)) => {
                    errors.push(problem(
                        format!("entries.{name}"),
                        "declares both 'dependency' and 'files'",
                    ));
                }
                (Some(notation), None) => {
                    if let Err(e) = Dependency::parse(notation) {
                        errors.push(problem(format!("entries.{name}.dependency"), e.to_string()));
                    }
                }
                (None, Some(files)) if files.is_empty() => {
                    errors.push(problem(
                        format!("entries.{name}.files"),
                        "must contain at least one path",
                    ));
                }
                _ => {}
            }

            match (&entry.from, &entry.to) {
                (Some(_), None) => errors
                    .push(problem(format!("entries.{name}.to"), "is required when 'from' is set")),
                (None, Some(_)) => errors
                    .push(problem(format!("entries.{name}.from"), "is required when 'to' is set")),
                _ => {}
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
