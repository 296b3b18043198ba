//! Entry registry: the arena of mapping entries addressed by name.
//!
//! Entries never hold references to each other. Parents and conversion
//! counterparts are looked up here by name at resolution time, which keeps
//! the graph free of ownership cycles and lets a configuration declare
//! entries in any order.
//!
//! The registry starts with the two built-in entries, `obfuscated` and
//! `official`, and is read-only once resolution starts.

mod traits;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::context::ResolveContext;
use crate::entry::{MappingEntry, OBFUSCATED, OFFICIAL};
use crate::error::MappingError;
use crate::table::MappingTable;

pub use traits::Registry;

/// Registry of mapping entries keyed by name.
#[derive(Debug)]
pub struct EntryRegistry {
    entries: BTreeMap<String, MappingEntry>,
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryRegistry {
    /// Create a registry holding only the built-in entries.
    pub fn new() -> Self {
        Self::with_builtins(MappingEntry::obfuscated(), MappingEntry::official())
    }

    /// Create a registry whose built-in entries cache `capacity` results each.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self::with_builtins(
            MappingEntry::obfuscated().with_cache_capacity(capacity),
            MappingEntry::official().with_cache_capacity(capacity),
        )
    }

    fn with_builtins(obfuscated: MappingEntry, official: MappingEntry) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(OBFUSCATED.to_string(), obfuscated);
        entries.insert(OFFICIAL.to_string(), official);
        Self { entries }
    }

    /// Register an entry.
    ///
    /// Names are unique, so the built-in names are rejected. The entry's
    /// format must accept its kind. Parents are not checked here, see
    /// [`EntryRegistry::validate`].
    pub fn register(&mut self, entry: MappingEntry) -> Result<(), MappingError> {
        if self.entries.contains_key(entry.name()) {
            return Err(MappingError::configuration(entry.name(), "is already registered"));
        }
        if let Some(format) = entry.format() {
            if !format.accepts(entry.kind()) {
                return Err(MappingError::configuration(
                    entry.name(),
                    format!("format '{}' cannot decode {} entries", format, entry.kind().name()),
                ));
            }
        }
        log::debug!("registered mappings entry '{}'", entry.name());
        self.entries.insert(entry.name().to_string(), entry);
        Ok(())
    }

    /// Look up an entry, failing with [`MappingError::UnknownEntry`].
    pub fn require(&self, name: &str) -> Result<&MappingEntry, MappingError> {
        self.entries.get(name).ok_or_else(|| MappingError::UnknownEntry(name.to_string()))
    }

    /// Iterate over all entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    /// Check the parent graph: every parent exists and no lineage loops.
    ///
    /// Returns every problem found rather than stopping at the first.
    pub fn validate(&self) -> Vec<MappingError> {
        let mut problems = Vec::new();

        for entry in self.entries.values() {
            if let Some(parent) = entry.parent() {
                if !self.entries.contains_key(parent) {
                    problems.push(MappingError::configuration(
                        entry.name(),
                        format!("parent '{parent}' is not registered"),
                    ));
                }
            }
        }

        // Each cycle is reported once, from its smallest member name.
        for entry in self.entries.values() {
            let mut chain = vec![entry.name()];
            let mut current = entry;
            while let Some(parent) = current.parent().and_then(|p| self.entries.get(p)) {
                if parent.name() == entry.name() {
                    let smallest = chain.iter().min().copied().unwrap_or(entry.name());
                    if smallest == entry.name() {
                        chain.push(parent.name());
                        problems.push(MappingError::CyclicMapping {
                            entry: entry.name().to_string(),
                            chain: chain.iter().map(|name| name.to_string()).collect(),
                        });
                    }
                    break;
                }
                if chain.contains(&parent.name()) {
                    // Loops further up; reported from its own members.
                    break;
                }
                chain.push(parent.name());
                current = parent;
            }
        }

        problems
    }

    /// Convenience for `require(to)?.convert_from(from, ctx)`.
    pub fn convert(
        &self,
        from: &str,
        to: &str,
        ctx: &ResolveContext,
    ) -> Result<Option<Arc<MappingTable>>, MappingError> {
        self.require(to)?.convert_from(from, ctx)
    }

    /// Drop every entry's cached results.
    pub fn clear_caches(&self) {
        for entry in self.entries.values() {
            entry.clear_cache();
        }
    }
}

impl Registry<MappingEntry> for EntryRegistry {
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.get(name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn names(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        Box::new(self.entries.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MappingFormat;

    fn plain(name: &str) -> MappingEntry {
        MappingEntry::new(name).with_format(MappingFormat::XSrg)
    }

    #[test]
    fn test_builtins_present() {
        let registry = EntryRegistry::new();
        assert!(registry.contains(OBFUSCATED));
        assert!(registry.contains(OFFICIAL));
        assert_eq!(registry.require(OFFICIAL).unwrap().format(), Some(MappingFormat::Fart));
        assert_eq!(registry.require(OBFUSCATED).unwrap().format_name(), "none");
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EntryRegistry::new();
        registry.register(plain("yarn")).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("yarn").unwrap().name(), "yarn");
        let names: Vec<&String> = registry.names().collect();
        assert_eq!(names, ["obfuscated", "official", "yarn"]);
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        let mut registry = EntryRegistry::new();
        assert!(registry.register(plain(OFFICIAL)).is_err());
        registry.register(plain("yarn")).unwrap();
        let err = registry.register(plain("yarn")).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_incompatible_format_rejected() {
        let mut registry = EntryRegistry::new();
        let entry = MappingEntry::namespaced("int", "official", "intermediary")
            .with_format(MappingFormat::Proguard);
        assert!(matches!(
            registry.register(entry),
            Err(MappingError::Configuration { ref entry, .. }) if entry == "int"
        ));
    }

    #[test]
    fn test_unknown_entry() {
        let registry = EntryRegistry::new();
        assert!(matches!(registry.require("nope"), Err(MappingError::UnknownEntry(_))));
    }

    #[test]
    fn test_validate_missing_parent() {
        let mut registry = EntryRegistry::new();
        registry.register(plain("a").with_parent("ghost")).unwrap();
        let problems = registry.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].to_string().contains("'ghost' is not registered"));
    }

    #[test]
    fn test_validate_cycle_reported_once() {
        let mut registry = EntryRegistry::new();
        registry.register(plain("a").with_parent("b")).unwrap();
        registry.register(plain("b").with_parent("c")).unwrap();
        registry.register(plain("c").with_parent("a")).unwrap();
        registry.register(plain("d").with_parent("a")).unwrap();

        let problems = registry.validate();
        assert_eq!(problems.len(), 1);
        match &problems[0] {
            MappingError::CyclicMapping { entry, chain } => {
                assert_eq!(entry, "a");
                assert_eq!(chain, &["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_validate_clean_chain() {
        let mut registry = EntryRegistry::new();
        registry.register(plain("a").with_parent(OFFICIAL)).unwrap();
        registry.register(plain("b").with_parent("a")).unwrap();
        assert!(registry.validate().is_empty());
    }
}
