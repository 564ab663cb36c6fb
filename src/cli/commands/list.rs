//! List command - show cached entries

use crate::cache::{Cache, CacheEntryInfo};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::RescacheResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> RescacheResult<()> {
    let cache = Cache::from_config(config)?;
    let entries = cache.entries().await?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "Cache is empty");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&cache, &entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(cache: &Cache, entries: &[CacheEntryInfo]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Cache entries");

    println!(
        "{:<40} {:>10}",
        style("RESOURCE").bold(),
        style("SIZE").bold()
    );
    println!("{}", "-".repeat(51));

    for entry in entries {
        let name = match &entry.resource {
            Some(resource) => resource.clone(),
            None => style(&entry.file_name).dim().to_string(),
        };
        println!("{:<40} {:>10}", name, format_size(entry.size));
    }

    let total: u64 = entries.iter().map(|e| e.size).sum();
    println!();
    ui::key_value(&ctx, "Root", &cache.root().display().to_string());
    ui::key_value(
        &ctx,
        "Total",
        &format!("{} entries, {}", entries.len(), format_size(total)),
    );
}

fn print_plain(entries: &[CacheEntryInfo]) {
    for entry in entries {
        println!("{}", entry.resource.as_deref().unwrap_or(&entry.file_name));
    }
}

/// Human-readable byte count
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
