//! Config command - show or edit configuration

use crate::cache::SerializationFormat;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::schema::validate_cache_name;
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use console::style;
use std::path::PathBuf;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> CacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> CacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {} (use --force to overwrite)",
            style("[WARN]").yellow(),
            path.display()
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized ({})",
        style("[OK]").green(),
        path.display()
    );
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> CacheResult<()> {
    let mut config = config.clone();
    apply_value(&mut config, key, value)?;

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("[OK]").green(), key, value);
    Ok(())
}

/// Apply a dot-separated key to the configuration
fn apply_value(config: &mut Config, key: &str, value: &str) -> CacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,

        ["cache", "root"] => config.cache.root = Some(PathBuf::from(value)),
        ["cache", "name"] => {
            validate_cache_name(value)?;
            config.cache.name = value.to_string()
        }
        ["cache", "entry_suffix"] => config.cache.entry_suffix = value.to_string(),
        ["cache", "default_lifetime"] => config.cache.default_lifetime = parse_u64(value)?,
        ["cache", "serialization_format"] => {
            config.cache.serialization_format = value
                .parse::<SerializationFormat>()
                .map_err(CacheError::User)?
        }

        _ => {
            return Err(CacheError::User(format!(
                "Unknown config key: {} (valid: {})",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "cache.root",
    "cache.name",
    "cache.entry_suffix",
    "cache.default_lifetime",
    "cache.serialization_format",
];

fn parse_bool(value: &str) -> CacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> CacheResult<u64> {
    value
        .parse()
        .map_err(|_| CacheError::User(format!("Invalid number: {}", value)))
}

fn parse_log_format(value: &str) -> CacheResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(CacheError::User(format!(
            "Invalid log format: {}. Use text/json",
            value
        ))),
    }
}
