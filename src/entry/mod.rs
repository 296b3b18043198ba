//! Mapping entries: named nodes of the resolution graph.
//!
//! An entry declares where its raw table comes from (a format and a
//! dependency), optionally a parent entry whose namespace its raw table
//! starts from, and whether the raw table must be inverted. Two operations
//! are exposed:
//!
//! - [`MappingEntry::resolve`]: the `obfuscated -> self` table
//! - [`MappingEntry::convert_from`]: the `other -> self` table
//!
//! # Resolution
//!
//! Resolving an entry walks its parent lineage up to the root (or to the
//! first ancestor with a cached result), decodes every raw table in the
//! lineage in parallel, and folds them root first with [`chain`]:
//!
//! ```text
//! obf -> root      = raw(root)
//! obf -> child     = chain(obf -> parent, raw(child))
//! ```
//!
//! The walk is iterative, so arbitrarily long lineages cannot overflow the
//! stack, and it keeps the names it visited so that a repeated name is
//! reported as [`MappingError::CyclicMapping`] instead of looping.
//!
//! The built-in `obfuscated` entry is the identity. Internally it resolves to
//! `None`, which [`chain`] composition treats as a unit element.

pub mod cache;

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::artifact::{ArtifactError, Dependency, HashAlgorithm, Side};
use crate::chain::{chain, chain_all};
use crate::context::ResolveContext;
use crate::error::MappingError;
use crate::format::MappingFormat;
use crate::state_key;
use crate::table::MappingTable;

use cache::{AdvisoryCache, CacheKey, DEFAULT_CAPACITY};

/// Name of the built-in identity entry.
pub const OBFUSCATED: &str = "obfuscated";

/// Name of the built-in entry backed by the version's published mappings.
pub const OFFICIAL: &str = "official";

/// Cached resolution result; `None` is the identity.
type Resolved = Option<Arc<MappingTable>>;

/// The kind of an entry, which decides how its raw table is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Single-pair artifact decoded as-is
    Plain,
    /// Multi-namespace artifact; `from`/`to` select the pair
    Namespaced { from: String, to: String },
    /// The implicit identity root
    Obfuscated,
    /// Per-side mappings published with the target version
    Official,
}

impl EntryKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Plain => "plain",
            EntryKind::Namespaced { .. } => "namespaced",
            EntryKind::Obfuscated => "obfuscated",
            EntryKind::Official => "official",
        }
    }
}

/// A named source of an `obfuscated -> name` table.
#[derive(Debug)]
pub struct MappingEntry {
    name: String,
    kind: EntryKind,
    format: Option<MappingFormat>,
    dependency: Option<Dependency>,
    parent: Option<String>,
    inverse: bool,
    cache: AdvisoryCache<CacheKey, Resolved>,
}

impl MappingEntry {
    fn with_kind(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            format: None,
            dependency: None,
            parent: None,
            inverse: false,
            cache: AdvisoryCache::new(DEFAULT_CAPACITY),
        }
    }

    /// A plain entry; configure it with the `with_*` methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, EntryKind::Plain)
    }

    /// An entry selecting the `from -> to` namespaces of a multi-namespace file.
    pub fn namespaced(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::with_kind(name, EntryKind::Namespaced { from: from.into(), to: to.into() })
    }

    /// The built-in identity entry.
    pub fn obfuscated() -> Self {
        Self::with_kind(OBFUSCATED, EntryKind::Obfuscated)
    }

    /// The built-in entry reading the version's per-side ProGuard mappings.
    pub fn official() -> Self {
        let mut entry = Self::with_kind(OFFICIAL, EntryKind::Official);
        entry.format = Some(MappingFormat::Fart);
        entry
    }

    pub fn with_format(mut self, format: MappingFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependency = Some(dependency);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Replace the result cache with one holding `capacity` results.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = AdvisoryCache::new(capacity);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn format(&self) -> Option<MappingFormat> {
        self.format
    }

    /// Format name as fed into state keys; the identity entry has none.
    pub fn format_name(&self) -> &'static str {
        self.format.map_or("none", |format| format.name())
    }

    pub fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Declared namespace pair for namespaced entries.
    pub fn namespaces(&self) -> Option<(&str, &str)> {
        match &self.kind {
            EntryKind::Namespaced { from, to } => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }

    /// Drop every cached result. Later calls recompute.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Resolve the `obfuscated -> self` table.
    ///
    /// The identity entry resolves to an empty table.
    pub fn resolve(&self, ctx: &ResolveContext) -> Result<Arc<MappingTable>, MappingError> {
        Ok(self.resolve_lineage(ctx)?.unwrap_or_default())
    }

    /// Compute the `other -> self` table.
    ///
    /// Returns `Ok(None)` when the conversion is a no-op: converting into the
    /// entry's own namespace, or between two identity namespaces. Failures are
    /// wrapped in [`MappingError::Conversion`] naming both sides.
    pub fn convert_from(
        &self,
        other: &str,
        ctx: &ResolveContext,
    ) -> Result<Option<Arc<MappingTable>>, MappingError> {
        if other == self.name {
            return Ok(None);
        }

        let key = CacheKey::conversion(ctx.platform(), other);
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("'{}' from '{}': cache hit", self.name, other);
            return Ok(hit);
        }
        log::debug!("'{}' from '{}': computing", self.name, other);

        let converted = self.compute_conversion(other, ctx).map_err(|source| {
            MappingError::Conversion {
                from: other.to_string(),
                to: self.name.clone(),
                source: Box::new(source),
            }
        })?;
        self.cache.insert(key, converted.clone());
        Ok(converted)
    }

    /// Deterministic digest of this entry's configuration, parents included.
    pub fn state_key(&self, is_from: bool, ctx: &ResolveContext) -> Result<String, MappingError> {
        state_key::entry_key(self, is_from, ctx.registry(), ctx.project_root())
    }

    fn compute_conversion(&self, other: &str, ctx: &ResolveContext) -> Result<Resolved, MappingError> {
        if other == OBFUSCATED {
            return self.resolve_lineage(ctx);
        }

        let other_entry = ctx.registry().require(other)?;
        let (theirs, ours) =
            ctx.join(|| other_entry.resolve_lineage(ctx), || self.resolve_lineage(ctx));

        Ok(match (theirs?, ours?) {
            (None, ours) => ours,
            (Some(theirs), None) => Some(Arc::new(theirs.reverse())),
            (Some(theirs), Some(ours)) => Some(Arc::new(chain(&theirs.reverse(), &ours))),
        })
    }

    /// Resolve through the parent lineage, filling every visited cache.
    fn resolve_lineage(&self, ctx: &ResolveContext) -> Result<Resolved, MappingError> {
        let key = CacheKey::resolved(ctx.platform());
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("'{}': cache hit", self.name);
            return Ok(hit);
        }

        let registry = ctx.registry();
        let mut lineage: Vec<&MappingEntry> = vec![self];
        let mut visited: Vec<&str> = vec![self.name.as_str()];
        let mut base: Resolved = None;
        let mut current = self;

        while let Some(parent_name) = current.parent() {
            if visited.contains(&parent_name) {
                let mut chain: Vec<String> = visited.iter().map(|name| name.to_string()).collect();
                chain.push(parent_name.to_string());
                return Err(MappingError::CyclicMapping { entry: parent_name.to_string(), chain });
            }
            visited.push(parent_name);

            let parent = registry.require(parent_name)?;
            if let Some(hit) = parent.cache.get(&key) {
                base = hit;
                break;
            }
            lineage.push(parent);
            current = parent;
        }

        // Root first from here on.
        lineage.reverse();
        log::debug!(
            "'{}': resolving lineage {}",
            self.name,
            lineage.iter().map(|entry| entry.name()).collect::<Vec<_>>().join(" -> ")
        );

        let raw_tables: Vec<Option<MappingTable>> = ctx.install(|| {
            lineage.par_iter().map(|entry| entry.load_raw(ctx)).collect::<Result<Vec<_>, _>>()
        })?;

        let mut resolved = base;
        for (entry, raw) in lineage.iter().zip(raw_tables) {
            resolved = compose(resolved, raw);
            entry.cache.insert(key.clone(), resolved.clone());
        }
        Ok(resolved)
    }

    /// Load this entry's own raw table, inverted if configured. `None` is
    /// the identity.
    fn load_raw(&self, ctx: &ResolveContext) -> Result<Option<MappingTable>, MappingError> {
        let raw = match self.kind {
            EntryKind::Obfuscated => return Ok(None),
            EntryKind::Official => self.load_official(ctx)?,
            EntryKind::Plain | EntryKind::Namespaced { .. } => self.load_dependency(ctx)?,
        };
        Ok(raw.map(|table| if self.inverse { table.reverse() } else { table }))
    }

    fn load_dependency(&self, ctx: &ResolveContext) -> Result<Option<MappingTable>, MappingError> {
        let format = self
            .format
            .ok_or_else(|| MappingError::configuration(&self.name, "must declare a format"))?;
        let dependency = self
            .dependency
            .as_ref()
            .ok_or_else(|| MappingError::configuration(&self.name, "must have a dependency"))?;
        if !format.accepts(&self.kind) {
            return Err(MappingError::configuration(
                &self.name,
                format!("format '{}' cannot decode {} entries", format, self.kind.name()),
            ));
        }

        let files = ctx.resolve_dependency(dependency).map_err(|e| MappingError::Resolver {
            entry: self.name.clone(),
            dependency: dependency.to_string(),
            message: e.to_string(),
        })?;
        let [file] = files.as_slice() else {
            return Err(MappingError::DependencyResolution {
                entry: self.name.clone(),
                dependency: dependency.to_string(),
                count: files.len(),
            });
        };

        self.decode(format, file).map(Some)
    }

    fn decode(&self, format: MappingFormat, path: &Path) -> Result<MappingTable, MappingError> {
        let table = format.decode(path, self).map_err(|source| MappingError::Format {
            entry: self.name.clone(),
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("'{}': decoded {} ({})", self.name, path.display(), table.stats());
        Ok(table)
    }

    /// Download, decode and reverse every side, then reduce in side order.
    fn load_official(&self, ctx: &ResolveContext) -> Result<Option<MappingTable>, MappingError> {
        let sides = ctx.platform().sides();
        let tables = ctx.install(|| {
            sides
                .par_iter()
                .map(|side| self.load_side(ctx, *side))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(chain_all(tables))
    }

    fn load_side(&self, ctx: &ResolveContext, side: Side) -> Result<MappingTable, MappingError> {
        let download_error = |message: String| MappingError::Download {
            entry: self.name.clone(),
            message,
        };

        let version = ctx.version().ok_or_else(|| {
            MappingError::configuration(&self.name, "no version metadata is configured")
        })?;
        let descriptor = version.mappings(side).ok_or_else(|| {
            download_error(format!("version {} has no {} mappings", version.id(), side))
        })?;

        let destination = ctx.namer().path(side.artifact_name(), "mappings", "txt");
        let path = ctx
            .downloader()
            .fetch(&descriptor.url, &destination, HashAlgorithm::Sha1, &descriptor.sha1)
            .map_err(|e: ArtifactError| download_error(format!("{side} mappings: {e}")))?
            .ok_or_else(|| {
                download_error(format!("could not download {side} mappings from {}", descriptor.url))
            })?;

        let format = self.format.unwrap_or(MappingFormat::Fart);
        // Published mappings go named -> obfuscated.
        Ok(self.decode(format, &path)?.reverse())
    }
}

/// One folding step: `obf -> parent` composed with `parent -> child`.
fn compose(parent: Resolved, raw: Option<MappingTable>) -> Resolved {
    match (parent, raw) {
        (Some(parent), Some(raw)) => Some(Arc::new(chain(&parent, &raw))),
        (None, Some(raw)) => Some(Arc::new(raw)),
        (parent, None) => parent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{LocalRepositoryResolver, Platform};
    use crate::registry::EntryRegistry;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn has_cached(entry: &MappingEntry, platform: Platform) -> bool {
        entry.cache.get(&CacheKey::resolved(platform)).is_some()
    }

    fn srg_entry(dir: &Path, name: &str, contents: &str) -> MappingEntry {
        let path = dir.join(format!("{name}.srg"));
        fs::write(&path, contents).unwrap();
        MappingEntry::new(name)
            .with_format(MappingFormat::XSrg)
            .with_dependency(Dependency::Files(vec![PathBuf::from(format!("{name}.srg"))]))
    }

    fn context(dir: &Path, entries: Vec<MappingEntry>) -> ResolveContext {
        let mut registry = EntryRegistry::new();
        for entry in entries {
            registry.register(entry).unwrap();
        }
        ResolveContext::new(registry, dir.to_path_buf())
            .with_resolver(LocalRepositoryResolver::new(dir))
    }

    #[test]
    fn test_obfuscated_resolves_to_empty() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![]);
        let table = ctx.registry().require(OBFUSCATED).unwrap().resolve(&ctx).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_dependency_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let entry = MappingEntry::new("bare").with_format(MappingFormat::XSrg);
        let ctx = context(temp.path(), vec![entry]);
        let err = ctx.registry().require("bare").unwrap().resolve(&ctx).unwrap_err();
        assert!(matches!(err, MappingError::Configuration { ref entry, .. } if entry == "bare"));
    }

    #[test]
    fn test_dependency_must_resolve_to_one_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.srg"), "CL: a b\n").unwrap();
        fs::write(temp.path().join("b.srg"), "CL: a c\n").unwrap();
        let entry = MappingEntry::new("many")
            .with_format(MappingFormat::XSrg)
            .with_dependency(Dependency::Files(vec![PathBuf::from("*.srg")]));
        let ctx = context(temp.path(), vec![entry]);

        let err = ctx.registry().require("many").unwrap().resolve(&ctx).unwrap_err();
        assert!(matches!(err, MappingError::DependencyResolution { count: 2, .. }));
    }

    #[test]
    fn test_inverse_reverses_raw_table() {
        let temp = TempDir::new().unwrap();
        let entry = srg_entry(temp.path(), "inv", "CL: Named a\n").with_inverse(true);
        let ctx = context(temp.path(), vec![entry]);
        let table = ctx.registry().require("inv").unwrap().resolve(&ctx).unwrap();
        assert_eq!(table.class("a").unwrap().mapped(), "Named");
    }

    #[test]
    fn test_parent_composition() {
        let temp = TempDir::new().unwrap();
        let b = srg_entry(temp.path(), "b", "CL: a y\n");
        let a = srg_entry(temp.path(), "a", "CL: y x\n").with_parent("b");
        let ctx = context(temp.path(), vec![a, b]);

        let table = ctx.registry().require("a").unwrap().resolve(&ctx).unwrap();
        assert_eq!(table.class("a").unwrap().mapped(), "x");
        assert!(has_cached(ctx.registry().require("b").unwrap(), Platform::Joined));
    }

    #[test]
    fn test_cycle_is_reported() {
        let temp = TempDir::new().unwrap();
        let a = srg_entry(temp.path(), "a", "CL: a b\n").with_parent("b");
        let b = srg_entry(temp.path(), "b", "CL: a b\n").with_parent("a");
        let ctx = context(temp.path(), vec![a, b]);

        let err = ctx.registry().require("a").unwrap().resolve(&ctx).unwrap_err();
        match err {
            MappingError::CyclicMapping { entry, chain } => {
                assert_eq!(entry, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_convert_from_self_is_noop() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![srg_entry(temp.path(), "a", "CL: a b\n")]);
        let entry = ctx.registry().require("a").unwrap();
        assert!(entry.convert_from("a", &ctx).unwrap().is_none());
    }

    #[test]
    fn test_convert_from_obfuscated_is_resolve() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![srg_entry(temp.path(), "a", "CL: a b\n")]);
        let entry = ctx.registry().require("a").unwrap();
        let converted = entry.convert_from(OBFUSCATED, &ctx).unwrap().unwrap();
        assert_eq!(*converted, *entry.resolve(&ctx).unwrap());
    }

    #[test]
    fn test_convert_between_entries() {
        let temp = TempDir::new().unwrap();
        let first = srg_entry(temp.path(), "first", "CL: a First\n");
        let second = srg_entry(temp.path(), "second", "CL: a Second\n");
        let ctx = context(temp.path(), vec![first, second]);

        let converted = ctx
            .registry()
            .require("second")
            .unwrap()
            .convert_from("first", &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(converted.class("First").unwrap().mapped(), "Second");
    }

    #[test]
    fn test_convert_into_obfuscated_reverses() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![srg_entry(temp.path(), "a", "CL: a Named\n")]);
        let converted = ctx
            .registry()
            .require(OBFUSCATED)
            .unwrap()
            .convert_from("a", &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(converted.class("Named").unwrap().mapped(), "a");
    }

    #[test]
    fn test_conversion_error_names_both_sides() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![srg_entry(temp.path(), "a", "CL: a b\n")]);
        let err = ctx
            .registry()
            .require("a")
            .unwrap()
            .convert_from("missing", &ctx)
            .unwrap_err();
        match err {
            MappingError::Conversion { from, to, source } => {
                assert_eq!(from, "missing");
                assert_eq!(to, "a");
                assert!(matches!(*source, MappingError::UnknownEntry(_)));
            }
            other => panic!("expected conversion error, got {other}"),
        }
    }

    #[test]
    fn test_results_are_cached_per_counterpart() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), vec![srg_entry(temp.path(), "a", "CL: a b\n")]);
        let entry = ctx.registry().require("a").unwrap();
        entry.convert_from(OBFUSCATED, &ctx).unwrap();
        // The artifact is gone; only cached results can answer now.
        fs::remove_file(temp.path().join("a.srg")).unwrap();
        assert!(entry.convert_from(OBFUSCATED, &ctx).is_ok());

        entry.clear_cache();
        assert!(entry.resolve(&ctx).is_err());
    }
}
