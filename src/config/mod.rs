//! Loading and saving `config.toml`
//!
//! The file is optional. A missing file, or a missing key inside it, falls
//! back to [`Config::default`]: one cache named `default` under the platform
//! cache directory, text encoding, one-hour lifetime. Command-line overrides
//! are applied by the caller after loading and are never written back.

pub mod schema;

pub use schema::{CacheConfig, Config, GeneralConfig};

use crate::error::{CacheError, CacheResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes one config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `<config dir>/filecache/config.toml`
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Manager for an explicit file, e.g. from `--config` or `FILECACHE_CONFIG`
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("filecache")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Parsed config, or defaults when the file does not exist.
    ///
    /// A file that exists but does not parse is an error naming the file;
    /// the cache name inside it is checked later, when a backend is opened.
    pub async fn load(&self) -> CacheResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(CacheError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config` in full, creating the parent directory first
    pub async fn save(&self, config: &Config) -> CacheResult<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)
            .await
            .map_err(|e| CacheError::io(format!("writing config to {}", path.display()), e))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
