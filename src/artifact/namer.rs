//! Cache directory layout for intermediate artifacts.

use std::path::PathBuf;

use super::ArtifactNamer;

/// Names artifacts `<root>/<kind>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct CacheDirNamer {
    root: PathBuf,
}

impl CacheDirNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactNamer for CacheDirNamer {
    fn path(&self, name: &str, kind: &str, extension: &str) -> PathBuf {
        self.root.join(kind).join(format!("{name}.{extension}"))
    }
}
