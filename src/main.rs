//! rescache - cache inspection and maintenance CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rescache::cli::args::{ConfigAction, ConfigArgs};
use rescache::cli::{Cli, Commands};
use rescache::config::{Config, ConfigManager};
use rescache::error::RescacheResult;
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
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RescacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // A broken config file must not block `config init --force`
    let forced_init = matches!(
        cli.command,
        Commands::Config(ConfigArgs {
            action: Some(ConfigAction::Init { force: true })
        })
    );
    let mut config = match config_manager.load().await {
        Ok(config) => config,
        Err(_) if forced_init => Config::default(),
        Err(e) => return Err(e),
    };

    init_logging(cli.verbose, &config.general.log_format);
    rescache::ui::init_theme();

    if let Some(root) = cli.root {
        debug!("Cache root overridden: {}", root.display());
        config.cache.root = Some(root);
    }

    match cli.command {
        Commands::Get(args) => rescache::cli::commands::get(args, &config).await,
        Commands::Put(args) => rescache::cli::commands::put(args, &config).await,
        Commands::Delete(args) => rescache::cli::commands::delete(args, &config).await,
        Commands::Path(args) => rescache::cli::commands::path(args, &config).await,
        Commands::List(args) => rescache::cli::commands::list(args, &config).await,
        Commands::Clear(args) => rescache::cli::commands::clear(args, &config).await,
        Commands::Config(args) => {
            rescache::cli::commands::config(args, &config, &config_manager).await
        }
        Commands::Settings(args) => {
            rescache::cli::commands::settings(args, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; RUST_LOG-style overrides are not read
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("rescache=warn"),
        1 => EnvFilter::new("rescache=info"),
        _ => EnvFilter::new("rescache=debug"),
    };

    // Logs go to stderr so command output stays pipeable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
