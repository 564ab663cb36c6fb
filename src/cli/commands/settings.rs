//! Settings command - read and write the typed settings store

use crate::cli::args::{SettingsAction, SettingsArgs};
use crate::config::ConfigManager;
use crate::error::RescacheResult;
use crate::settings::SettingsStore;
use crate::ui::{self, UiContext};

/// Execute the settings command
pub async fn execute(args: SettingsArgs, manager: &ConfigManager) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    let store = SettingsStore::open(manager.settings_path()).await?;

    match args.action {
        SettingsAction::List => {
            let all = store.all();
            if all.is_empty() {
                ui::step_info(&ctx, "No settings stored");
            }
            for (key, value) in &all {
                println!("{} = {}", key, value);
            }
        }
        SettingsAction::Get { key } => match store.raw(&key) {
            Some(value) => println!("{}", value),
            None => ui::step_info(&ctx, &format!("{} is not set", key)),
        },
        SettingsAction::Set { key, value } => {
            store.set_raw(&key, parse_value(&value)).await?;
            ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
        }
        SettingsAction::Unset { key } => {
            if store.remove(&key).await? {
                ui::step_ok(&ctx, &format!("Removed {}", key));
            } else {
                ui::step_info(&ctx, &format!("{} is not set", key));
            }
        }
    }

    Ok(())
}

/// Interpret a command-line string as the narrowest TOML scalar
fn parse_value(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(n) = value.parse::<i64>() {
        toml::Value::Integer(n)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(value.to_string())
    }
}
