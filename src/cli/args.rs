//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// filecache - file-backed cache with tags, expiry and freezing
///
/// Stores payloads under identifiers in a cache directory. Entries can be
/// tagged for bulk invalidation and frozen once they stop changing.
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FILECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base cache directory (overrides cache.root)
    #[arg(long, global = true, env = "FILECACHE_ROOT")]
    pub root: Option<PathBuf>,

    /// Cache name (overrides cache.name)
    #[arg(long = "cache", global = true)]
    pub cache_name: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store an entry
    Set(SetArgs),

    /// Print an entry's payload
    Get(EntryArgs),

    /// Report whether a live entry exists
    Has(EntryArgs),

    /// Remove an entry
    Remove(EntryArgs),

    /// List identifiers of entries carrying any of the given tags
    Find(TagArgs),

    /// Remove entries carrying any of the given tags
    FlushTag(TagArgs),

    /// Remove every entry and leave frozen mode
    Flush,

    /// Remove expired entries
    Gc,

    /// Freeze the cache: reject writes, ignore expiry
    Freeze,

    /// Show cache state
    Status(StatusArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the set command
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Entry identifier
    pub identifier: String,

    /// Payload (reads stdin when neither this nor --file is given)
    pub value: Option<String>,

    /// Read the payload from a file
    #[arg(short, long, conflicts_with = "value")]
    pub file: Option<PathBuf>,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Lifetime in seconds (0 = unlimited, default from config)
    #[arg(short, long)]
    pub lifetime: Option<u64>,
}

/// Arguments naming a single entry
#[derive(Parser, Debug)]
pub struct EntryArgs {
    /// Entry identifier
    pub identifier: String,
}

/// Arguments for tag commands
#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Tags to match (any)
    #[arg(required = true, num_args = 1..)]
    pub tags: Vec<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.default_lifetime)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}
