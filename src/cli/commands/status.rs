//! Status command - show cache state

use super::with_backend;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::CacheResult;
use console::{style, Emoji};
use serde::Serialize;
use std::path::PathBuf;

static FROZEN: Emoji<'_, '_> = Emoji("❄ ", "[FROZEN] ");
static MUTABLE: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");

/// Snapshot of a cache's state
#[derive(Debug, Serialize)]
struct StatusReport {
    name: String,
    root: PathBuf,
    frozen: bool,
    entries: usize,
    frozen_entries: Option<usize>,
    serialization_format: String,
    entry_suffix: String,
    default_lifetime: u64,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> CacheResult<()> {
    let cache = config.cache.clone();
    let report = with_backend(config, move |backend| {
        Ok(StatusReport {
            name: backend.name().to_string(),
            root: backend.root().to_path_buf(),
            frozen: backend.is_frozen(),
            entries: backend.enumerate()?.len(),
            frozen_entries: backend.frozen_identifiers().map(|ids| ids.len()),
            serialization_format: backend.format().to_string(),
            entry_suffix: cache.entry_suffix,
            default_lifetime: cache.default_lifetime,
        })
    })
    .await?;

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_table(report: &StatusReport) {
    println!("{}", style(format!("Cache {}", report.name)).bold().cyan());
    println!();

    let state = if report.frozen {
        format!("{}{}", FROZEN, style("frozen").cyan())
    } else {
        format!("{}{}", MUTABLE, style("mutable").green())
    };
    println!("  {:<18} {}", "State:", state);
    println!("  {:<18} {}", "Root:", report.root.display());
    println!("  {:<18} {}", "Entry files:", report.entries);
    if let Some(frozen) = report.frozen_entries {
        println!("  {:<18} {}", "Frozen entries:", frozen);
    }
    println!("  {:<18} {}", "Format:", report.serialization_format);

    let suffix = if report.entry_suffix.is_empty() {
        "(none)"
    } else {
        report.entry_suffix.as_str()
    };
    println!("  {:<18} {}", "Entry suffix:", suffix);

    let lifetime = match report.default_lifetime {
        0 => "unlimited".to_string(),
        secs => format!("{}s", secs),
    };
    println!("  {:<18} {}", "Default lifetime:", lifetime);
}
