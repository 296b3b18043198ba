//! Hand-off to bytecode rewriting.
//!
//! A [`Renamer`] answers "what is this identifier called on the other side"
//! for every kind of symbol a bytecode transformer meets. It is an opaque
//! view over a resolved table: the rewriting itself happens elsewhere.
//!
//! A [`RemapRequest`] names the two entries of a conversion, gives the
//! pairwise state key for build caching, and produces the renamer.

use std::sync::Arc;

use crate::context::ResolveContext;
use crate::error::MappingError;
use crate::state_key;
use crate::table::{MappingTable, MethodMapping};

/// Renames identifiers from a table's left namespace into its right one.
///
/// Unknown identifiers map to themselves.
#[derive(Debug, Clone)]
pub struct Renamer {
    table: Arc<MappingTable>,
}

impl Renamer {
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self { table }
    }

    /// The table backing this renamer.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Internal class name; unknown inner classes follow their outer class.
    pub fn class(&self, name: &str) -> String {
        self.table.remap_class(name)
    }

    /// Package name (slash separated, no trailing slash).
    pub fn package(&self, name: &str) -> String {
        self.table.package(name).map_or_else(|| name.to_string(), |p| p.mapped().to_string())
    }

    pub fn field(&self, owner: &str, name: &str) -> String {
        self.table
            .class(owner)
            .and_then(|class| class.field(name))
            .map_or_else(|| name.to_string(), |field| field.mapped().to_string())
    }

    /// Method name; `descriptor` is in the left namespace.
    pub fn method(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.find_method(owner, name, descriptor)
            .map_or_else(|| name.to_string(), |method| method.mapped().to_string())
    }

    /// Parameter name by ordinal, or `None` when the table has no name for it.
    pub fn parameter(&self, owner: &str, method: &str, descriptor: &str, index: u32) -> Option<String> {
        self.find_method(owner, method, descriptor)?
            .parameter(index)?
            .mapped()
            .map(str::to_string)
    }

    /// Rewrite every class referenced by a field or method descriptor.
    pub fn descriptor(&self, descriptor: &str) -> String {
        self.table.remap_descriptor(descriptor)
    }

    fn find_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&MethodMapping> {
        self.table.class(owner)?.method(name, descriptor)
    }
}

/// A conversion between two registered entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapRequest {
    from: String,
    to: String,
}

impl RemapRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    pub fn source(&self) -> &str {
        &self.from
    }

    pub fn target(&self) -> &str {
        &self.to
    }

    /// Pairwise key: `key(from) + "-" + key(to)`, separator dropped when the
    /// source key is empty.
    pub fn state_key(&self, ctx: &ResolveContext) -> Result<String, MappingError> {
        state_key::conversion_key(&self.from, &self.to, ctx.registry(), ctx.project_root())
    }

    /// Build a renamer for the conversion, or `None` when it is a no-op.
    pub fn provide_renamer(&self, ctx: &ResolveContext) -> Result<Option<Renamer>, MappingError> {
        let table = ctx.registry().convert(&self.from, &self.to, ctx)?;
        Ok(table.map(Renamer::new))
    }
}
