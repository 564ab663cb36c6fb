//! Clear command - wipe the cache root

use crate::cache::Cache;
use crate::cli::args::ClearArgs;
use crate::cli::commands::list::format_size;
use crate::config::Config;
use crate::error::RescacheResult;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> RescacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let cache = Cache::from_config(config)?;

    let entries = cache.entries().await?;
    if entries.is_empty() {
        cache.wipe_all().await?;
        ui::step_info(&ctx, "Cache was already empty, no disk space was reclaimed.");
        return Ok(());
    }

    let size = cache.disk_usage().await?;
    let prompt = format!(
        "Remove {} cached entries ({}) from {}?",
        entries.len(),
        format_size(size),
        cache.root().display()
    );

    // Without a terminal there is nobody to ask; require --yes
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Cache not cleared", "Pass --yes to skip the prompt");
        return Ok(());
    }

    cache.wipe_all().await?;
    ui::outro_success(&ctx, &format!("Cleaned {}.", format_size(size)));

    Ok(())
}
