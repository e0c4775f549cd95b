//! filecache - file-backed cache engine
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use filecache::cli::commands::{self, entry, maintenance, tags};
use filecache::cli::{Cli, Commands};
use filecache::config::{Config, ConfigManager};
use filecache::error::CacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            // 2: the same invocation will fail again
            if e.is_caller_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let mut config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    // Config edits must not persist command-line overrides
    let file_config = config.clone();

    if let Some(root) = cli.root {
        config.cache.root = Some(root);
    }
    if let Some(name) = cli.cache_name {
        config.cache.name = name;
    }

    match cli.command {
        Commands::Set(args) => entry::set(args, &config).await,
        Commands::Get(args) => entry::get(args, &config).await,
        Commands::Has(args) => entry::has(args, &config).await,
        Commands::Remove(args) => entry::remove(args, &config).await,
        Commands::Find(args) => tags::find(args, &config).await,
        Commands::FlushTag(args) => tags::flush_tag(args, &config).await,
        Commands::Flush => maintenance::flush(&config).await,
        Commands::Gc => maintenance::gc(&config).await,
        Commands::Freeze => maintenance::freeze(&config).await,
        Commands::Status(args) => commands::status(args, &config).await,
        Commands::Config(args) => commands::config(args, &file_config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one level
fn init_logging(verbose: u8, config: &Config) {
    let level = verbose.saturating_add(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("filecache=warn"),
        1 => EnvFilter::new("filecache=info"),
        _ => EnvFilter::new("filecache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
