//! CLI command implementations

pub mod config;
pub mod entry;
pub mod maintenance;
pub mod status;
pub mod tags;

pub use config::execute as config;
pub use status::execute as status;

use crate::cache::FileBackend;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};

/// Open the configured backend and run `op` on the blocking pool.
///
/// The engine does synchronous, locking file I/O.
pub(crate) async fn with_backend<T, F>(config: &Config, op: F) -> CacheResult<T>
where
    F: FnOnce(&mut FileBackend) -> CacheResult<T> + Send + 'static,
    T: Send + 'static,
{
    let options = config.cache.backend_options()?;
    tokio::task::spawn_blocking(move || {
        let mut backend = FileBackend::open(options)?;
        op(&mut backend)
    })
    .await
    .map_err(|e| CacheError::Internal(format!("cache task failed: {e}")))?
}
