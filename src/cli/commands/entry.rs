//! Single-resource commands: get, put, delete, path

use crate::cache::{Cache, ResourceId};
use crate::cli::args::{PutArgs, ResourceArgs};
use crate::config::Config;
use crate::error::RescacheResult;
use crate::ui::{self, UiContext};
use serde_json::Value;
use tracing::debug;

/// Print a cached value as pretty JSON
pub async fn get(args: ResourceArgs, config: &Config) -> RescacheResult<()> {
    let id = resource_id(&args, config)?;
    let cache = Cache::from_config(config)?;

    match cache.handle::<Value>(id.clone()).load().await {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => {
            let ctx = UiContext::detect();
            ui::step_info(&ctx, &format!("No cached value for {}", id));
        }
    }

    Ok(())
}

/// Store a JSON value
pub async fn put(args: PutArgs, config: &Config) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    let id = resource_id(&args.resource, config)?;
    let value: Value = serde_json::from_str(&args.value)?;

    let cache = Cache::from_config(config)?;
    let handle = cache.handle::<Value>(id.clone());
    handle.save(Some(&value)).wait().await;

    // Saves never fail loudly; read back to tell the user what happened
    if handle.load().await.as_ref() == Some(&value) {
        ui::step_ok_detail(
            &ctx,
            &format!("Saved {}", id),
            &handle.path().display().to_string(),
        );
    } else {
        ui::step_warn_hint(
            &ctx,
            &format!("{} was not persisted", id),
            "Run with -v for details",
        );
    }

    Ok(())
}

/// Delete a cached value
pub async fn delete(args: ResourceArgs, config: &Config) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    let id = resource_id(&args, config)?;
    let cache = Cache::from_config(config)?;

    cache.handle::<Value>(id.clone()).delete().wait().await;
    ui::step_ok(&ctx, &format!("Deleted {}", id));

    Ok(())
}

/// Print the entry path of a resource
pub async fn path(args: ResourceArgs, config: &Config) -> RescacheResult<()> {
    let id = resource_id(&args, config)?;
    let cache = Cache::from_config(config)?;
    println!("{}", cache.path_for(&id).display());
    Ok(())
}

/// Resolve the resource id, applying the configured session scope
fn resource_id(args: &ResourceArgs, config: &Config) -> RescacheResult<ResourceId> {
    let scope = if args.global {
        None
    } else {
        args.user
            .as_deref()
            .or(config.session.user_id.as_deref())
    };
    debug!("Resolving {} with scope {:?}", args.name, scope);
    ResourceId::with_scope(args.name.as_str(), scope)
}
