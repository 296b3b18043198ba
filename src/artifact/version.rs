//! Version descriptor JSON.
//!
//! Only the parts needed to locate per-side mappings are modelled:
//!
//! ```json
//! {
//!   "id": "1.20.1",
//!   "downloads": {
//!     "client_mappings": { "sha1": "...", "size": 7418452, "url": "..." },
//!     "server_mappings": { "sha1": "...", "size": 5732425, "url": "..." }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{ArtifactError, DownloadDescriptor, Side, VersionMetadata};

#[derive(Debug, Clone, Deserialize)]
struct Download {
    sha1: String,
    url: String,
}

/// A parsed version descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionDescriptor {
    id: String,
    #[serde(default)]
    downloads: HashMap<String, Download>,
}

impl VersionDescriptor {
    /// Parse a descriptor from JSON text.
    pub fn parse(text: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a descriptor from a file.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

impl VersionMetadata for VersionDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn mappings(&self, side: Side) -> Option<DownloadDescriptor> {
        self.downloads
            .get(side.metadata_key())
            .map(|d| DownloadDescriptor { url: d.url.clone(), sha1: d.sha1.clone() })
    }
}
