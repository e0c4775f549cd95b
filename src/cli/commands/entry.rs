//! Single-entry commands: set, get, has, remove

use super::with_backend;
use crate::cli::args::{EntryArgs, SetArgs};
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use std::io::{self, Read, Write};
use tokio::fs;
use tracing::debug;

/// Execute the set command
pub async fn set(args: SetArgs, config: &Config) -> CacheResult<()> {
    let payload = match (args.value, &args.file) {
        (Some(value), _) => value.into_bytes(),
        (None, Some(path)) => fs::read(path)
            .await
            .map_err(|e| CacheError::io(format!("reading payload from {}", path.display()), e))?,
        (None, None) => read_stdin().await?,
    };
    debug!("Setting {} ({} bytes)", args.identifier, payload.len());

    let identifier = args.identifier;
    let tags = args.tags;
    let lifetime = args.lifetime;
    with_backend(config, move |backend| {
        backend.set(&identifier, &payload, &tags, lifetime)
    })
    .await
}

/// Execute the get command; a miss is an error so scripts can branch on it
pub async fn get(args: EntryArgs, config: &Config) -> CacheResult<()> {
    let identifier = args.identifier.clone();
    let payload = with_backend(config, move |backend| backend.get(&identifier)).await?;

    match payload {
        Some(payload) => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&payload)
                .and_then(|()| stdout.flush())
                .map_err(|e| CacheError::io("writing payload to stdout", e))
        }
        None => Err(CacheError::User(format!(
            "No live cache entry: {}",
            args.identifier
        ))),
    }
}

/// Execute the has command
pub async fn has(args: EntryArgs, config: &Config) -> CacheResult<()> {
    let found = with_backend(config, move |backend| backend.has(&args.identifier)).await?;
    println!("{}", found);
    Ok(())
}

/// Execute the remove command
pub async fn remove(args: EntryArgs, config: &Config) -> CacheResult<()> {
    let identifier = args.identifier.clone();
    let removed = with_backend(config, move |backend| backend.remove(&identifier)).await?;

    if removed {
        println!("Removed {}", args.identifier);
    } else {
        println!("No entry for {}", args.identifier);
    }
    Ok(())
}

async fn read_stdin() -> CacheResult<Vec<u8>> {
    tokio::task::spawn_blocking(|| {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map(|_| buf)
            .map_err(|e| CacheError::io("reading payload from stdin", e))
    })
    .await
    .map_err(|e| CacheError::Internal(format!("stdin task failed: {e}")))?
}
