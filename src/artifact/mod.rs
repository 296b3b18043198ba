//! External collaborators that turn dependency declarations into local files.
//!
//! The resolution engine never touches the network or a build tool directly.
//! It goes through four small traits:
//!
//! - [`DependencyResolver`]: dependency declaration to local file paths
//! - [`Downloader`]: URL to a hash-validated local file
//! - [`VersionMetadata`]: per-side download descriptors for the target version
//! - [`ArtifactNamer`]: stable paths for intermediate downloaded artifacts
//!
//! Local implementations of each live in the submodules and back the CLI.

mod download;
mod namer;
mod resolver;
mod version;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use download::LocalDownloader;
pub use namer::CacheDirNamer;
pub use resolver::{expand_files, LocalRepositoryResolver};
pub use version::VersionDescriptor;

/// Error raised by the local collaborator implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Malformed `group:name:version` coordinate
    #[error("invalid coordinate '{0}' (expected group:name:version[:classifier][@extension])")]
    InvalidCoordinate(String),
    /// Invalid glob pattern in a file dependency
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// The resolver does not know how to fetch this dependency kind
    #[error("cannot resolve {kind} dependency '{notation}'")]
    UnsupportedDependency { kind: String, notation: String },
    /// URL scheme the downloader cannot fetch
    #[error("unsupported download URL '{0}'")]
    UnsupportedUrl(String),
    /// Downloaded content does not match the published hash
    #[error("{algorithm} mismatch for {}: expected {expected}, got {actual}", path.display())]
    HashMismatch { path: PathBuf, algorithm: HashAlgorithm, expected: String, actual: String },
    /// Malformed version descriptor
    #[error("invalid version descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deployment variant of the target artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Client,
    Server,
    #[default]
    Joined,
}

impl Platform {
    /// Sides contributing to this platform, in reduction order.
    pub fn sides(self) -> &'static [Side] {
        match self {
            Platform::Client => &[Side::Client],
            Platform::Server => &[Side::Server],
            Platform::Joined => &[Side::Client, Side::Server],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Client => "client",
            Platform::Server => "server",
            Platform::Joined => "joined",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Platform::Client),
            "server" => Ok(Platform::Server),
            "joined" => Ok(Platform::Joined),
            other => Err(format!("unknown platform '{other}' (expected client, server or joined)")),
        }
    }
}

/// One side of a platform, carrying its own mappings artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    /// Key of this side's mappings in the version metadata downloads.
    pub fn metadata_key(self) -> &'static str {
        match self {
            Side::Client => "client_mappings",
            Side::Server => "server_mappings",
        }
    }

    /// Logical name of the cached mappings artifact.
    pub fn artifact_name(self) -> &'static str {
        match self {
            Side::Client => "client_m-obf",
            Side::Server => "server_m-obf",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Client => "client",
            Side::Server => "server",
        })
    }
}

/// Hash algorithms accepted for download validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase hex digest of `bytes`.
    pub fn digest(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha1 => format!("{:x}", Sha1::digest(bytes)),
            HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        }
    }

    /// Lowercase hex digest of the file at `path`.
    pub fn digest_file(self, path: &Path) -> io::Result<String> {
        Ok(self.digest(&fs::read(path)?))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        })
    }
}

/// `group:name:version[:classifier][@extension]` artifact coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: Option<String>,
}

impl FromStr for Coordinate {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, extension) = match s.split_once('@') {
            Some((body, ext)) => (body, Some(ext.to_string())),
            None => (s, None),
        };
        let parts: Vec<&str> = body.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) || extension.as_deref() == Some("") {
            return Err(ArtifactError::InvalidCoordinate(s.to_string()));
        }
        match parts.as_slice() {
            [group, name, version] | [group, name, version, _] => Ok(Coordinate {
                group: group.to_string(),
                name: name.to_string(),
                version: version.to_string(),
                classifier: parts.get(3).map(|c| c.to_string()),
                extension,
            }),
            _ => Err(ArtifactError::InvalidCoordinate(s.to_string())),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        if let Some(extension) = &self.extension {
            write!(f, "@{extension}")?;
        }
        Ok(())
    }
}

/// Where an entry's raw mapping artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Published artifact addressed by coordinate
    Coordinate(Coordinate),
    /// Local files; entries may be glob patterns
    Files(Vec<PathBuf>),
    /// Any other notation (`project:...`, remote URLs, ...)
    Other { kind: String, notation: String },
}

impl Dependency {
    /// Parse a dependency notation from configuration.
    ///
    /// `scheme:rest` notations whose scheme is not a coordinate group
    /// (`project:`, `http:`, ...) become [`Dependency::Other`].
    pub fn parse(notation: &str) -> Result<Self, ArtifactError> {
        const SCHEMES: &[&str] = &["project", "http", "https", "git"];
        if let Some((scheme, _)) = notation.split_once(':') {
            if SCHEMES.contains(&scheme) {
                return Ok(Dependency::Other {
                    kind: scheme.to_string(),
                    notation: notation.to_string(),
                });
            }
        }
        notation.parse().map(Dependency::Coordinate)
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Dependency::Coordinate(_) => "coordinate",
            Dependency::Files(_) => "files",
            Dependency::Other { kind, .. } => kind,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Coordinate(coordinate) => fmt::Display::fmt(coordinate, f),
            Dependency::Files(files) => {
                let files: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                write!(f, "files({})", files.join(", "))
            }
            Dependency::Other { notation, .. } => f.write_str(notation),
        }
    }
}

/// Download location and expected hash for one side's artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    pub url: String,
    pub sha1: String,
}

/// Resolves a dependency declaration to local files.
///
/// Implementations may hold non-reentrant state; callers serialize access.
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, dependency: &Dependency) -> Result<Vec<PathBuf>, ArtifactError>;
}

/// Fetches a URL into `destination`, validating its hash.
///
/// Returns `Ok(None)` when the source does not exist.
pub trait Downloader: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
        algorithm: HashAlgorithm,
        expected: &str,
    ) -> Result<Option<PathBuf>, ArtifactError>;
}

/// Version metadata for the build target.
pub trait VersionMetadata: Send + Sync {
    /// Version identifier, used in diagnostics.
    fn id(&self) -> &str;

    /// Download descriptor for `side`'s mappings, if the version publishes one.
    fn mappings(&self, side: Side) -> Option<DownloadDescriptor>;
}

/// Stable paths for intermediate artifacts.
pub trait ArtifactNamer: Send + Sync {
    fn path(&self, name: &str, kind: &str, extension: &str) -> PathBuf;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_sides_order() {
        assert_eq!(Platform::Joined.sides(), &[Side::Client, Side::Server]);
        assert_eq!(Platform::Server.sides(), &[Side::Server]);
        assert_eq!("client".parse::<Platform>().unwrap(), Platform::Client);
        assert!("both".parse::<Platform>().is_err());
    }

    #[test]
    fn test_side_names() {
        assert_eq!(Side::Client.metadata_key(), "client_mappings");
        assert_eq!(Side::Server.artifact_name(), "server_m-obf");
    }

    #[test]
    fn test_parse_coordinate() {
        let coordinate: Coordinate = "net.fabricmc:yarn:1.20.1+build.1:v2@jar".parse().unwrap();
        assert_eq!(coordinate.group, "net.fabricmc");
        assert_eq!(coordinate.name, "yarn");
        assert_eq!(coordinate.version, "1.20.1+build.1");
        assert_eq!(coordinate.classifier.as_deref(), Some("v2"));
        assert_eq!(coordinate.extension.as_deref(), Some("jar"));
        assert_eq!(coordinate.to_string(), "net.fabricmc:yarn:1.20.1+build.1:v2@jar");
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!("a:b".parse::<Coordinate>().is_err());
        assert!("a::c".parse::<Coordinate>().is_err());
        assert!("a:b:c:d:e".parse::<Coordinate>().is_err());
        assert!("a:b:c@".parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_dependency_parse_kinds() {
        assert!(matches!(Dependency::parse("g:n:1").unwrap(), Dependency::Coordinate(_)));
        let other = Dependency::parse("project::mappings").unwrap();
        assert_eq!(other.kind(), "project");
        assert_eq!(other.to_string(), "project::mappings");
    }

    #[test]
    fn test_digest() {
        assert_eq!(
            HashAlgorithm::Sha1.digest(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            HashAlgorithm::Sha256.digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
