//! Error types for mapping resolution and decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while decoding a mapping artifact.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// IO error reading the artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed line in a text format
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed container
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// The container is valid but lacks the expected entry
    #[error("could not find {0} in archive")]
    MissingResource(String),
    /// The text did not match any syntax this format understands
    #[error("unrecognized mappings syntax")]
    UnrecognizedSyntax,
    /// A requested namespace is not declared by the file
    #[error("namespace '{requested}' not present (available: {})", available.join(", "))]
    UnknownNamespace { requested: String, available: Vec<String> },
    /// More than two namespaces and the entry does not say which to use
    #[error(
        "mappings file has more than two namespaces ({}); declare `from` and `to` on the entry",
        found.join(", ")
    )]
    AmbiguousNamespaces { found: Vec<String> },
}

impl FormatError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }
}

/// Error raised while resolving or converting mapping entries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    /// Entry is missing required configuration
    #[error("mappings entry '{entry}': {message}")]
    Configuration { entry: String, message: String },
    /// Referenced entry is not registered
    #[error("unknown mappings entry '{0}'")]
    UnknownEntry(String),
    /// Dependency did not resolve to exactly one file
    #[error("mappings entry '{entry}' did not resolve to exactly 1 file ({dependency} resolved to {count})")]
    DependencyResolution { entry: String, dependency: String, count: usize },
    /// Dependency resolver failed outright
    #[error("mappings entry '{entry}': could not resolve {dependency}: {message}")]
    Resolver { entry: String, dependency: String, message: String },
    /// Artifact content could not be decoded
    #[error("mappings entry '{entry}': could not read {}: {source}", path.display())]
    Format {
        entry: String,
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    /// Download or hash validation failed for a per-side artifact
    #[error("mappings entry '{entry}': {message}")]
    Download { entry: String, message: String },
    /// Entry revisited while resolving its own parent chain
    #[error("Recursive mapping dependencies for '{entry}': {}", chain.join(" -> "))]
    CyclicMapping { entry: String, chain: Vec<String> },
    /// Dependency kind cannot be hashed into a stable state key
    #[error("mappings entry '{entry}': dependency kind '{kind}' cannot be hashed; build caching would be disabled")]
    UnsupportedDependencyKind { entry: String, kind: String },
    /// Failure while converting between two entries
    #[error("converting '{from}' to '{to}': {source}")]
    Conversion {
        from: String,
        to: String,
        #[source]
        source: Box<MappingError>,
    },
}

impl MappingError {
    pub(crate) fn configuration(entry: &str, message: impl Into<String>) -> Self {
        Self::Configuration { entry: entry.to_string(), message: message.into() }
    }

    /// Name of the entry the failure is attributed to.
    pub fn entry(&self) -> &str {
        match self {
            Self::Configuration { entry, .. }
            | Self::DependencyResolution { entry, .. }
            | Self::Resolver { entry, .. }
            | Self::Format { entry, .. }
            | Self::Download { entry, .. }
            | Self::CyclicMapping { entry, .. }
            | Self::UnsupportedDependencyKind { entry, .. } => entry,
            Self::UnknownEntry(name) => name,
            Self::Conversion { source, .. } => source.entry(),
        }
    }
}
