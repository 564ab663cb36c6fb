//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rescache - persistent JSON resource cache
///
/// Inspect and manage the key-addressed cache shared by applications on
/// this machine.
#[derive(Parser, Debug)]
#[command(name = "rescache")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RESCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory (overrides the configured root)
    #[arg(long, global = true, env = "RESCACHE_ROOT")]
    pub root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a cached value
    Get(ResourceArgs),

    /// Store a JSON value
    Put(PutArgs),

    /// Delete a cached value
    Delete(ResourceArgs),

    /// Print the file path backing a resource
    Path(ResourceArgs),

    /// List cached entries
    List(ListArgs),

    /// Remove every cached entry
    Clear(ClearArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Read and write typed settings
    Settings(SettingsArgs),
}

/// Selects one resource
#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Resource name
    pub name: String,

    /// Scope the resource to a user or session (defaults to session.user_id)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Ignore the configured session scope
    #[arg(long, conflicts_with = "user")]
    pub global: bool,
}

/// Arguments for the put command
#[derive(Args, Debug)]
pub struct PutArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,

    /// JSON value to store
    pub value: String,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clear command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
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
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.atomic_writes)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Arguments for the settings command
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Settings subcommand
    #[command(subcommand)]
    pub action: SettingsAction,
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// List every stored setting
    List,

    /// Print one setting
    Get {
        /// Setting key
        key: String,
    },

    /// Store a setting (true/false, numbers and strings are recognised)
    Set {
        /// Setting key
        key: String,
        /// Value to store
        value: String,
    },

    /// Remove a setting
    Unset {
        /// Setting key
        key: String,
    },
}
