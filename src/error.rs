//! Error types for filecache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for filecache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in filecache
#[derive(Error, Debug)]
pub enum CacheError {
    // Caller errors
    #[error("Invalid cache entry identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Cannot modify cache entries because the backend of cache \"{cache}\" is frozen")]
    Frozen { cache: String },

    #[error("The cache \"{cache}\" is already frozen")]
    AlreadyFrozen { cache: String },

    #[error("Invalid cache name {name:?}: {reason}")]
    InvalidCacheName { name: String, reason: String },

    // Write errors
    #[error("The cache file {path} could not be written: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: WriteFailure,
    },

    // Cache directory errors
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache root is not a directory: {0}")]
    CacheDirInvalid(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

/// Why a cache file write did not complete
#[derive(Error, Debug)]
pub enum WriteFailure {
    #[error("path is {length} bytes long, exceeding the OS limit of {max}")]
    PathTooLong { length: usize, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to decode an entry blob or a frozen snapshot.
///
/// Never converted into a [`CacheError`]: `get`, `has` and tag scans report
/// a miss instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("blob is truncated ({0} bytes, header needs {1})")]
    Truncated(usize, usize),

    #[error("declared tag section of {declared} bytes exceeds the {available} bytes available")]
    TagSectionOverrun { declared: usize, available: usize },

    #[error("tag section is malformed: {0}")]
    Tags(String),

    #[error("snapshot is malformed: {0}")]
    Snapshot(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(identifier: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the caller rather than the environment; retrying
    /// the same call will fail the same way.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::InvalidCacheName { .. }
                | Self::Frozen { .. }
                | Self::AlreadyFrozen { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Frozen { .. } | Self::AlreadyFrozen { .. } => {
                Some("Run: filecache flush (this discards every entry)")
            }
            Self::InvalidIdentifier { .. } => {
                Some("Identifiers must be non-empty and must not contain '/'")
            }
            Self::InvalidCacheName { .. } => {
                Some("A cache name is a single directory name, e.g. --cache pages")
            }
            Self::WriteFailed {
                source: WriteFailure::PathTooLong { .. },
                ..
            } => Some("Use a shorter cache root or identifier"),
            Self::CacheDirInvalid(_) => Some("Point cache.root at a directory"),
            _ => None,
        }
    }
}
