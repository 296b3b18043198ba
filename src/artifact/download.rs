//! Downloader for locally reachable artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ArtifactError, Downloader, HashAlgorithm};

/// Copies `file://` URLs and plain paths into the artifact cache, validating
/// the published hash.
///
/// A destination that already holds content with the expected hash is reused
/// without copying.
#[derive(Debug, Clone)]
pub struct LocalDownloader {
    base_dir: PathBuf,
}

impl LocalDownloader {
    /// Relative source paths resolve against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn source_path(&self, url: &str) -> Result<PathBuf, ArtifactError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") {
            return Err(ArtifactError::UnsupportedUrl(url.to_string()));
        }
        Ok(self.base_dir.join(url))
    }
}

impl Downloader for LocalDownloader {
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
        algorithm: HashAlgorithm,
        expected: &str,
    ) -> Result<Option<PathBuf>, ArtifactError> {
        let expected = expected.to_ascii_lowercase();

        if destination.is_file() && algorithm.digest_file(destination)? == expected {
            log::debug!("reusing cached {}", destination.display());
            return Ok(Some(destination.to_path_buf()));
        }

        let source = self.source_path(url)?;
        if !source.is_file() {
            return Ok(None);
        }

        log::info!("fetching {} -> {}", url, destination.display());
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, destination)?;

        let actual = algorithm.digest_file(destination)?;
        if actual != expected {
            fs::remove_file(destination)?;
            return Err(ArtifactError::HashMismatch {
                path: destination.to_path_buf(),
                algorithm,
                expected,
                actual,
            });
        }
        Ok(Some(destination.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_copies_and_validates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("client.txt"), "a -> b:\n").unwrap();
        let expected = HashAlgorithm::Sha1.digest(b"a -> b:\n");
        let destination = temp.path().join("cache/mappings/client_m-obf.txt");

        let downloader = LocalDownloader::new(temp.path());
        let fetched = downloader
            .fetch("client.txt", &destination, HashAlgorithm::Sha1, &expected)
            .unwrap();
        assert_eq!(fetched.as_deref(), Some(destination.as_path()));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "a -> b:\n");
    }

    #[test]
    fn test_fetch_file_url() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("server.txt");
        fs::write(&source, "x").unwrap();
        let url = format!("file://{}", source.display());
        let destination = temp.path().join("out.txt");

        let expected = HashAlgorithm::Sha256.digest(b"x");
        let downloader = LocalDownloader::new("/nonexistent");
        assert!(downloader
            .fetch(&url, &destination, HashAlgorithm::Sha256, &expected)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_hash_mismatch_removes_destination() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("client.txt"), "tampered").unwrap();
        let destination = temp.path().join("out.txt");

        let downloader = LocalDownloader::new(temp.path());
        let err = downloader
            .fetch("client.txt", &destination, HashAlgorithm::Sha1, "0000")
            .unwrap_err();
        assert!(matches!(err, ArtifactError::HashMismatch { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_missing_source_is_none() {
        let temp = TempDir::new().unwrap();
        let downloader = LocalDownloader::new(temp.path());
        let fetched = downloader
            .fetch("missing.txt", &temp.path().join("out.txt"), HashAlgorithm::Sha1, "00")
            .unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn test_cached_destination_is_reused() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("cached.txt");
        fs::write(&destination, "cached").unwrap();
        let expected = HashAlgorithm::Sha1.digest(b"cached");

        let downloader = LocalDownloader::new(temp.path());
        let fetched = downloader
            .fetch("does-not-exist.txt", &destination, HashAlgorithm::Sha1, &expected)
            .unwrap();
        assert_eq!(fetched, Some(destination));
    }

    #[test]
    fn test_remote_urls_unsupported() {
        let temp = TempDir::new().unwrap();
        let downloader = LocalDownloader::new(temp.path());
        let err = downloader
            .fetch("https://example.com/m.txt", &temp.path().join("o"), HashAlgorithm::Sha1, "0")
            .unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedUrl(_)));
    }
}
