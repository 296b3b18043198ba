//! Zip container probing shared by the container-aware formats.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::FormatError;

/// Read the first of `candidates` present in the zip at `path`.
///
/// Returns `Ok(None)` when `path` is not a zip at all, so the caller can fall
/// back to flat decoding. A zip that contains none of the candidates is an
/// error naming the first (preferred) path.
pub(super) fn read_entry(path: &Path, candidates: &[&str]) -> Result<Option<String>, FormatError> {
    let file = File::open(path)?;
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(ZipError::InvalidArchive(_)) | Err(ZipError::UnsupportedArchive(_)) => {
            log::debug!("{} is not a container, reading it as flat text", path.display());
            return Ok(None);
        }
        Err(ZipError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    for candidate in candidates {
        match archive.by_name(candidate) {
            Ok(mut entry) => {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                return Ok(Some(text));
            }
            Err(ZipError::FileNotFound) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let preferred = candidates.first().copied().unwrap_or_default();
    Err(FormatError::MissingResource(preferred.to_string()))
}
