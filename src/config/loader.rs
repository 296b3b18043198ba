//! Configuration loading and discovery for `mappings.toml`
//!
//! Provides functions to find and load configuration, and to turn it into a
//! populated [`EntryRegistry`] and [`ResolveContext`].

use super::schema::{EntryConfig, MappingsConfig};
use crate::artifact::{
    ArtifactError, CacheDirNamer, LocalRepositoryResolver, Platform, VersionDescriptor,
};
use crate::context::ResolveContext;
use crate::entry::MappingEntry;
use crate::registry::EntryRegistry;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file name searched for by [`find_config`].
pub const CONFIG_FILE: &str = "mappings.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse mappings.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// Version descriptor could not be loaded
    #[error("Failed to load version descriptor {}: {source}", path.display())]
    Version {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the platform
    pub platform: Option<Platform>,
    /// Override the number of parallel jobs
    pub jobs: Option<usize>,
    /// Override the per-entry cache capacity
    pub cache_capacity: Option<usize>,
}

/// Find mappings.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find mappings.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a mappings.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration (built-in entries only).
///
/// Returns the configuration together with its project root: the directory
/// holding the file, or the working directory when none was found.
pub fn load_config(path: Option<&Path>) -> Result<(MappingsConfig, PathBuf), ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            let config = load_config_file(&p)?;
            let root = project_root(&p).map(Path::to_path_buf).unwrap_or_default();
            Ok((config, root))
        }
        None => Ok((MappingsConfig::default(), env::current_dir()?)),
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<MappingsConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: MappingsConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    log::debug!("loaded {} with {} entries", path.display(), config.entries.len());
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut MappingsConfig, overrides: &CliOverrides) {
    if let Some(platform) = overrides.platform {
        config.settings.platform = platform;
    }
    if let Some(jobs) = overrides.jobs {
        config.settings.jobs = Some(jobs);
    }
    if let Some(capacity) = overrides.cache_capacity {
        config.settings.cache_capacity = capacity;
    }
}

fn build_entry(name: &str, config: &EntryConfig) -> Result<MappingEntry, String> {
    let mut entry = match (&config.from, &config.to) {
        (Some(from), Some(to)) => MappingEntry::namespaced(name, from, to),
        _ => MappingEntry::new(name),
    };
    if let Some(format) = config.mapping_format() {
        entry = entry.with_format(format);
    }
    if let Some(dependency) = config.mapping_dependency() {
        entry = entry.with_dependency(dependency?);
    }
    if let Some(parent) = &config.parent {
        entry = entry.with_parent(parent);
    }
    Ok(entry.with_inverse(config.inverse))
}

/// Register every configured entry, then check the parent graph.
///
/// All problems are collected into a single [`ConfigError::Validation`].
pub fn build_registry(config: &MappingsConfig) -> Result<EntryRegistry, ConfigError> {
    let capacity = config.settings.cache_capacity;
    let mut registry = EntryRegistry::with_cache_capacity(capacity);
    let mut problems = Vec::new();

    for (name, entry_config) in &config.entries {
        let registered = build_entry(name, entry_config)
            .map_err(|message| format!("mappings entry '{name}': {message}"))
            .and_then(|entry| {
                registry.register(entry.with_cache_capacity(capacity)).map_err(|e| e.to_string())
            });
        if let Err(problem) = registered {
            problems.push(problem);
        }
    }
    problems.extend(registry.validate().into_iter().map(|e| e.to_string()));

    if problems.is_empty() {
        Ok(registry)
    } else {
        Err(ConfigError::Validation(problems))
    }
}

/// Build the resolution context for a configuration rooted at `root`.
pub fn build_context(config: &MappingsConfig, root: &Path) -> Result<ResolveContext, ConfigError> {
    let settings = &config.settings;
    let registry = build_registry(config)?;

    let resolver = settings
        .repositories
        .iter()
        .fold(LocalRepositoryResolver::new(root), |resolver, repo| resolver.with_repository(repo));

    let mut ctx = ResolveContext::new(registry, root.to_path_buf())
        .with_platform(settings.platform)
        .with_resolver(resolver)
        .with_namer(CacheDirNamer::new(resolve_path(root, &settings.cache_dir)));

    if let Some(jobs) = settings.jobs {
        ctx = ctx.with_jobs(jobs);
    }
    if let Some(version) = &settings.version {
        let path = resolve_path(root, version);
        let descriptor = VersionDescriptor::load(&path)
            .map_err(|source| ConfigError::Version { path: path.clone(), source })?;
        ctx = ctx.with_version(descriptor);
    }

    Ok(ctx)
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the mappings.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactNamer, VersionMetadata};
    use crate::format::{MappingFormat, ParameterDocs};
    use crate::registry::Registry;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE);
        fs::write(&config_path, contents).expect("should write config content");
        config_path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let subdir = temp.path().join("src").join("main");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            r#"
[settings]
platform = "client"

[entries.yarn]
format = "tiny"
files = ["yarn.tiny"]
"#,
        );

        let (config, root) = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(root, temp.path());
        assert_eq!(config.settings.platform, Platform::Client);
        assert!(config.entries.contains_key("yarn"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[entries.official]\nformat = \"proguard\"\n");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_build_registry_registers_entries() {
        let config: MappingsConfig = toml::from_str(
            r#"
[entries.int]
format = "tiny"
files = ["int.tiny"]
from = "official"
to = "intermediary"

[entries.docs]
format = "parchment"
files = ["parchment.json"]
parent = "int"
parameter_docs = "parameter"
"#,
        )
        .unwrap();

        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.len(), 4);
        let int = registry.require("int").unwrap();
        assert_eq!(int.namespaces(), Some(("official", "intermediary")));
        let docs = registry.require("docs").unwrap();
        assert_eq!(docs.parent(), Some("int"));
        assert_eq!(docs.format(), Some(MappingFormat::Parchment(ParameterDocs::PerParameter)));
    }

    #[test]
    fn test_build_registry_collects_graph_problems() {
        let config: MappingsConfig = toml::from_str(
            r#"
[entries.a]
format = "xsrg"
files = ["a.srg"]
parent = "b"

[entries.b]
format = "xsrg"
files = ["b.srg"]
parent = "a"

[entries.c]
format = "xsrg"
files = ["c.srg"]
parent = "ghost"
"#,
        )
        .unwrap();

        match build_registry(&config) {
            Err(ConfigError::Validation(problems)) => {
                assert_eq!(problems.len(), 2);
                assert!(problems.iter().any(|p| p.contains("'ghost' is not registered")));
                assert!(problems.iter().any(|p| p.contains("Recursive mapping dependencies")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_build_registry_rejects_incompatible_format() {
        let config: MappingsConfig = toml::from_str(
            "[entries.a]\nformat = \"proguard\"\nfiles = [\"a\"]\nfrom = \"x\"\nto = \"y\"",
        )
        .unwrap();
        assert!(matches!(build_registry(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_build_context_applies_settings() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::write(temp.path().join("version.json"), r#"{"id": "1.20.1", "downloads": {}}"#).unwrap();
        let config: MappingsConfig = toml::from_str(
            "[settings]\nplatform = \"server\"\njobs = 3\nversion = \"version.json\"\ncache_dir = \"cache\"",
        )
        .unwrap();

        let ctx = build_context(&config, temp.path()).unwrap();
        assert_eq!(ctx.platform(), Platform::Server);
        assert_eq!(ctx.jobs(), 3);
        assert_eq!(ctx.version().map(|v| v.id()), Some("1.20.1"));
        assert_eq!(
            ctx.namer().path("server_m-obf", "mappings", "txt"),
            temp.path().join("cache").join("mappings").join("server_m-obf.txt")
        );
    }

    #[test]
    fn test_build_context_missing_version_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config: MappingsConfig = toml::from_str("[settings]\nversion = \"missing.json\"").unwrap();
        assert!(matches!(build_context(&config, temp.path()), Err(ConfigError::Version { .. })));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = MappingsConfig::default();
        let overrides = CliOverrides {
            platform: Some(Platform::Client),
            jobs: Some(2),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.settings.platform, Platform::Client);
        assert_eq!(config.settings.jobs, Some(2));
        assert_eq!(config.settings.cache_capacity, 16);
    }

    #[test]
    fn test_resolve_path_absolute() {
        let root = Path::new("/project");
        let absolute = Path::new("/other/path");
        assert_eq!(resolve_path(root, absolute), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let root = Path::new("/project");
        let relative = Path::new("maven");
        assert_eq!(resolve_path(root, relative), PathBuf::from("/project/maven"));
    }

    #[test]
    fn test_project_root() {
        let config_path = Path::new("/project/mappings.toml");
        assert_eq!(project_root(config_path), Some(Path::new("/project")));
    }
}
