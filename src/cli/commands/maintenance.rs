//! Whole-cache commands: flush, gc, freeze

use super::with_backend;
use crate::config::Config;
use crate::error::CacheResult;
use console::style;

/// Execute the flush command
pub async fn flush(config: &Config) -> CacheResult<()> {
    with_backend(config, |backend| backend.flush()).await?;
    println!("{} Flushed cache {}", style("[OK]").green(), config.cache.name);
    Ok(())
}

/// Execute the gc command
pub async fn gc(config: &Config) -> CacheResult<()> {
    let stats = with_backend(config, |backend| Ok(backend.collect_garbage())).await?;
    println!(
        "{} Removed {} expired entries, kept {}",
        style("[OK]").green(),
        stats.removed,
        stats.kept
    );
    Ok(())
}

/// Execute the freeze command
pub async fn freeze(config: &Config) -> CacheResult<()> {
    let count = with_backend(config, |backend| {
        backend.freeze()?;
        Ok(backend.frozen_identifiers().map_or(0, |ids| ids.len()))
    })
    .await?;
    println!(
        "{} Froze cache {} with {} entries",
        style("[OK]").green(),
        config.cache.name,
        count
    );
    Ok(())
}
