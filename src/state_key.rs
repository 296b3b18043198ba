//! Deterministic cache keys for entries and conversions.
//!
//! An entry key is the lowercase hex SHA-256 of, in order:
//!
//! | Tag | Payload |
//! |-----|---------|
//! | `0` | entry name |
//! | `1` | format name (`none` for the identity entry) |
//! | `2` | dependency: `group:name:version` for coordinates, file contents for files |
//! | `3` | present when the entry is inverted |
//! | `4` | the parent's own key material, fed into the same digest |
//!
//! Parents are walked iteratively with a visited guard. The built-in roots
//! collapse out of pairwise keys: `obfuscated` hashes to the empty string as
//! a conversion source, `official` as a conversion target.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::artifact::{expand_files, Dependency};
use crate::entry::{EntryKind, MappingEntry};
use crate::error::MappingError;
use crate::registry::EntryRegistry;

const TAG_NAME: u8 = 0;
const TAG_FORMAT: u8 = 1;
const TAG_DEPENDENCY: u8 = 2;
const TAG_INVERSE: u8 = 3;
const TAG_PARENT: u8 = 4;

/// Key for `entry` used on the `from` (`is_from = true`) or `to` side of a
/// conversion.
pub fn entry_key(
    entry: &MappingEntry,
    is_from: bool,
    registry: &EntryRegistry,
    base_dir: &Path,
) -> Result<String, MappingError> {
    match entry.kind() {
        EntryKind::Obfuscated if is_from => return Ok(String::new()),
        EntryKind::Official if !is_from => return Ok(String::new()),
        _ => {}
    }

    let mut hasher = Sha256::new();
    let mut visited: Vec<&str> = Vec::new();
    let mut current = Some(entry);

    while let Some(node) = current {
        if visited.contains(&node.name()) {
            let mut chain: Vec<String> = visited.iter().map(|name| name.to_string()).collect();
            chain.push(node.name().to_string());
            return Err(MappingError::CyclicMapping { entry: node.name().to_string(), chain });
        }
        visited.push(node.name());

        hasher.update([TAG_NAME]);
        hasher.update(node.name().as_bytes());
        hasher.update([TAG_FORMAT]);
        hasher.update(node.format_name().as_bytes());

        if let Some(dependency) = node.dependency() {
            hasher.update([TAG_DEPENDENCY]);
            hash_dependency(&mut hasher, node.name(), dependency, base_dir)?;
        }
        if node.is_inverse() {
            hasher.update([TAG_INVERSE]);
        }

        current = match node.parent() {
            Some(parent) => {
                hasher.update([TAG_PARENT]);
                Some(registry.require(parent)?)
            }
            None => None,
        };
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn hash_dependency(
    hasher: &mut Sha256,
    entry: &str,
    dependency: &Dependency,
    base_dir: &Path,
) -> Result<(), MappingError> {
    match dependency {
        Dependency::Coordinate(coordinate) => {
            hasher.update(coordinate.group.as_bytes());
            hasher.update(b":");
            hasher.update(coordinate.name.as_bytes());
            hasher.update(b":");
            hasher.update(coordinate.version.as_bytes());
        }
        Dependency::Files(patterns) => {
            let files = expand_files(base_dir, patterns).map_err(|e| MappingError::Resolver {
                entry: entry.to_string(),
                dependency: dependency.to_string(),
                message: e.to_string(),
            })?;
            for file in files {
                match fs::read(&file) {
                    Ok(contents) => hasher.update(&contents),
                    Err(e) => log::warn!("'{}': could not hash {}: {}", entry, file.display(), e),
                }
            }
        }
        Dependency::Other { kind, notation } => {
            log::warn!(
                "'{}': dependency '{}' of kind '{}' cannot be hashed; build caching is disabled",
                entry,
                notation,
                kind
            );
            return Err(MappingError::UnsupportedDependencyKind {
                entry: entry.to_string(),
                kind: kind.clone(),
            });
        }
    }
    Ok(())
}

/// Combine two entry keys into a conversion key.
pub fn pair_key(from: &str, to: &str) -> String {
    if from.is_empty() {
        to.to_string()
    } else {
        format!("{from}-{to}")
    }
}

/// Key of the `from -> to` conversion.
pub fn conversion_key(
    from: &str,
    to: &str,
    registry: &EntryRegistry,
    base_dir: &Path,
) -> Result<String, MappingError> {
    let from_key = entry_key(registry.require(from)?, true, registry, base_dir)?;
    let to_key = entry_key(registry.require(to)?, false, registry, base_dir)?;
    Ok(pair_key(&from_key, &to_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Coordinate;
    use crate::entry::{OBFUSCATED, OFFICIAL};
    use crate::format::MappingFormat;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn coordinate(notation: &str) -> Dependency {
        Dependency::Coordinate(notation.parse::<Coordinate>().unwrap())
    }

    fn yarn() -> MappingEntry {
        MappingEntry::new("yarn")
            .with_format(MappingFormat::Tiny)
            .with_dependency(coordinate("net.fabricmc:yarn:1.0:v2"))
    }

    fn key(entry: MappingEntry) -> String {
        let mut registry = EntryRegistry::new();
        let name = entry.name().to_string();
        registry.register(entry).unwrap();
        entry_key(registry.require(&name).unwrap(), true, &registry, Path::new(".")).unwrap()
    }

    #[test]
    fn test_key_is_deterministic_hex() {
        let first = key(yarn());
        assert_eq!(first, key(yarn()));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_each_attribute_changes_key() {
        let base = key(yarn());
        let renamed = MappingEntry::new("other")
            .with_format(MappingFormat::Tiny)
            .with_dependency(coordinate("net.fabricmc:yarn:1.0:v2"));
        assert_ne!(base, key(renamed));
        assert_ne!(base, key(yarn().with_format(MappingFormat::Tsrg)));
        assert_ne!(base, key(yarn().with_dependency(coordinate("net.fabricmc:yarn:1.1:v2"))));
        assert_ne!(base, key(yarn().with_inverse(true)));
        assert_ne!(base, key(yarn().with_parent(OBFUSCATED)));
    }

    #[test]
    fn test_classifier_does_not_affect_key() {
        assert_eq!(key(yarn()), key(yarn().with_dependency(coordinate("net.fabricmc:yarn:1.0"))));
    }

    #[test]
    fn test_file_contents_feed_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("m.srg");
        let entry = || {
            MappingEntry::new("files")
                .with_format(MappingFormat::XSrg)
                .with_dependency(Dependency::Files(vec![PathBuf::from("m.srg")]))
        };
        let mut registry = EntryRegistry::new();
        registry.register(entry()).unwrap();
        let files = registry.require("files").unwrap();

        fs::write(&path, "CL: a b\n").unwrap();
        let before = entry_key(files, true, &registry, temp.path()).unwrap();
        fs::write(&path, "CL: a c\n").unwrap();
        let after = entry_key(files, true, &registry, temp.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_unsupported_dependency_kind_fails() {
        let entry = MappingEntry::new("proj")
            .with_format(MappingFormat::XSrg)
            .with_dependency(Dependency::parse("project::mappings").unwrap());
        let mut registry = EntryRegistry::new();
        registry.register(entry).unwrap();
        let err = entry_key(registry.require("proj").unwrap(), true, &registry, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, MappingError::UnsupportedDependencyKind { ref kind, .. } if kind == "project"));
    }

    #[test]
    fn test_builtin_roots_collapse() {
        let registry = EntryRegistry::new();
        let obfuscated = registry.require(OBFUSCATED).unwrap();
        let official = registry.require(OFFICIAL).unwrap();
        let dot = Path::new(".");

        assert_eq!(entry_key(obfuscated, true, &registry, dot).unwrap(), "");
        assert_ne!(entry_key(obfuscated, false, &registry, dot).unwrap(), "");
        assert_eq!(entry_key(official, false, &registry, dot).unwrap(), "");
        assert_ne!(entry_key(official, true, &registry, dot).unwrap(), "");
    }

    #[test]
    fn test_pair_key() {
        assert_eq!(pair_key("", "abc"), "abc");
        assert_eq!(pair_key("ab", "cd"), "ab-cd");
        let registry = EntryRegistry::new();
        let key = conversion_key(OBFUSCATED, OFFICIAL, &registry, Path::new(".")).unwrap();
        assert_eq!(key, "");
    }

    #[test]
    fn test_parent_cycle_is_reported() {
        let mut registry = EntryRegistry::new();
        registry.register(yarn().with_parent("loop")).unwrap();
        registry
            .register(MappingEntry::new("loop").with_format(MappingFormat::XSrg).with_parent("yarn"))
            .unwrap();
        let err = entry_key(registry.require("yarn").unwrap(), true, &registry, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, MappingError::CyclicMapping { .. }));
    }
}
