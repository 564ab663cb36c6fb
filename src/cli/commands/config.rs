//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{RescacheError, RescacheResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "cache.root",
    "cache.directory",
    "cache.atomic_writes",
    "session.user_id",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> RescacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> RescacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    // Edit the file as stored, without command-line overrides
    let mut config = manager.load().await?;

    if let Err(e) = apply_value(&mut config, key, value) {
        ui::step_error_detail(&ctx, "Cannot set config key", key);
        ui::remark(&ctx, &format!("Valid keys: {}", VALID_KEYS.join(", ")));
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply a dot-separated key to a config; empty values clear optional keys
fn apply_value(config: &mut Config, key: &str, value: &str) -> RescacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(RescacheError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["cache", "root"] => config.cache.root = non_empty(value).map(PathBuf::from),
        ["cache", "directory"] => {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(RescacheError::User(format!(
                    "Invalid cache directory name: {:?}",
                    value
                )));
            }
            config.cache.directory = value.to_string();
        }
        ["cache", "atomic_writes"] => config.cache.atomic_writes = parse_bool(value)?,
        ["session", "user_id"] => config.session.user_id = non_empty(value).map(str::to_string),
        _ => return Err(RescacheError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn parse_bool(value: &str) -> RescacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RescacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}
