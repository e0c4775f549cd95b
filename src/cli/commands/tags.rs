//! Tag commands: find, flush-tag

use super::with_backend;
use crate::cli::args::TagArgs;
use crate::config::Config;
use crate::error::CacheResult;

/// Execute the find command, one identifier per line
pub async fn find(args: TagArgs, config: &Config) -> CacheResult<()> {
    let identifiers = with_backend(config, move |backend| {
        Ok(backend.find_identifiers_by_tags(&args.tags))
    })
    .await?;

    for identifier in identifiers {
        println!("{}", identifier);
    }
    Ok(())
}

/// Execute the flush-tag command
pub async fn flush_tag(args: TagArgs, config: &Config) -> CacheResult<()> {
    let removed = with_backend(config, move |backend| backend.flush_by_tags(&args.tags)).await?;
    println!("Removed {} entries", removed);
    Ok(())
}
