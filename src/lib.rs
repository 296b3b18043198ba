//! Mapchain - resolve, compose and cache symbol mapping tables
//!
//! This library provides functionality to:
//! - Decode mapping artifacts (ProGuard, SRG/XSRG, TSRG, Tiny v2, Parchment)
//!   into a common [`MappingTable`]
//! - Reverse and chain tables between naming namespaces
//! - Declare named mapping entries layered on parent entries, resolve them
//!   lazily with caching, and convert between any two of them
//! - Compute deterministic state keys for build caching
//! - Hand a [`Renamer`] to a bytecode rewriter

pub mod artifact;
pub mod chain;
pub mod cli;
pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod format;
pub mod registry;
pub mod remap;
pub mod state_key;
pub mod table;

pub use chain::{chain, chain_all};
pub use context::ResolveContext;
pub use entry::MappingEntry;
pub use error::{FormatError, MappingError};
pub use format::MappingFormat;
pub use registry::EntryRegistry;
pub use remap::{RemapRequest, Renamer};
pub use table::MappingTable;
