//! Identifier validation and entry file paths
//!
//! Every identifier passes through [`PathMapper::validate`] before the file
//! system is touched. An identifier must be its own basename, so it can never
//! name anything outside the cache root.

use crate::error::{CacheError, CacheResult, WriteFailure};
use std::path::{Path, PathBuf};

/// File name of the frozen snapshot marker inside the cache root
pub const SNAPSHOT_FILE: &str = "FrozenCache.data";

/// Longest path the OS accepts
#[cfg(unix)]
pub const MAX_PATH_LEN: usize = libc::PATH_MAX as usize;
#[cfg(not(unix))]
pub const MAX_PATH_LEN: usize = 260;

/// Maps identifiers to files under one cache root
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
    suffix: String,
}

impl PathMapper {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Reject identifiers that are empty or carry a path segment
    pub fn validate(&self, identifier: &str) -> CacheResult<()> {
        if identifier.is_empty() {
            return Err(CacheError::invalid_identifier(identifier, "must not be empty"));
        }
        if identifier.contains('\0') {
            return Err(CacheError::invalid_identifier(identifier, "must not contain NUL"));
        }

        let basename = Path::new(identifier).file_name().and_then(|n| n.to_str());
        if basename != Some(identifier) {
            return Err(CacheError::invalid_identifier(
                identifier,
                "must not contain a path segment",
            ));
        }

        if self.file_name(identifier) == SNAPSHOT_FILE {
            return Err(CacheError::invalid_identifier(
                identifier,
                "collides with the frozen snapshot marker",
            ));
        }
        Ok(())
    }

    /// `root/<identifier><suffix>`; callers validate first
    pub fn entry_path(&self, identifier: &str) -> PathBuf {
        self.root.join(self.file_name(identifier))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Strip the entry suffix from a directory listing name.
    ///
    /// Returns `None` for names that cannot belong to an entry: the snapshot
    /// marker, or a name without the suffix.
    pub fn identifier_from_filename<'a>(&self, filename: &'a str) -> Option<&'a str> {
        if filename == SNAPSHOT_FILE {
            return None;
        }
        let identifier = filename.strip_suffix(self.suffix.as_str())?;
        (!identifier.is_empty()).then_some(identifier)
    }

    fn file_name(&self, identifier: &str) -> String {
        format!("{}{}", identifier, self.suffix)
    }
}

/// Fail with `PathTooLong` if `path` exceeds what the OS accepts
pub fn enforce_path_length(path: &Path) -> Result<(), WriteFailure> {
    let length = path.as_os_str().len();
    if length > MAX_PATH_LEN {
        return Err(WriteFailure::PathTooLong {
            length,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}
