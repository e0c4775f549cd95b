//! Configuration schema for filecache
//!
//! Configuration is stored at `~/.config/filecache/config.toml`

use crate::cache::{BackendOptions, SerializationFormat, DEFAULT_LIFETIME};
use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache backend settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base directory; each named cache lives in `<root>/<name>/`
    pub root: Option<PathBuf>,

    /// Cache name
    pub name: String,

    /// Appended to every identifier to form the entry file name
    pub entry_suffix: String,

    /// Lifetime in seconds when none is given (0 = unlimited)
    pub default_lifetime: u64,

    /// Tag and snapshot encoding: "text" or "binary"
    pub serialization_format: SerializationFormat,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            name: "default".to_string(),
            entry_suffix: String::new(),
            default_lifetime: DEFAULT_LIFETIME,
            serialization_format: SerializationFormat::Text,
        }
    }
}

impl CacheConfig {
    /// Configured root, or the platform cache directory
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("filecache")
        })
    }

    /// Directory holding this cache's entry files.
    ///
    /// `flush` empties this directory, so the name must stay a single
    /// component strictly below the root.
    pub fn cache_dir(&self) -> CacheResult<PathBuf> {
        validate_cache_name(&self.name)?;
        Ok(self.root_dir().join(&self.name))
    }

    pub fn backend_options(&self) -> CacheResult<BackendOptions> {
        Ok(BackendOptions {
            cache_name: self.name.clone(),
            cache_root: self.cache_dir()?,
            entry_suffix: self.entry_suffix.clone(),
            default_lifetime: self.default_lifetime,
            format: self.serialization_format,
        })
    }
}

/// A cache name must be one normal path component: not empty, no separator,
/// not `.` or `..`
pub fn validate_cache_name(name: &str) -> CacheResult<()> {
    let invalid = |reason: &str| CacheError::InvalidCacheName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains('\0') {
        return Err(invalid("must not contain NUL"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        (Some(Component::ParentDir), None) => Err(invalid("must not refer to a parent directory")),
        (Some(Component::CurDir), None) => Err(invalid("must not refer to the cache root itself")),
        _ => Err(invalid("must be a single directory name")),
    }
}
