//! List command - show cache stores in the storage

use crate::cache::{AppId, CacheStorage, DiskStorage, Generation};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// How a store relates to the configured generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// The configured generation
    Current,
    /// Older or newer generation of the configured app
    Stale,
    /// Anything else
    Foreign,
}

#[derive(Debug, Serialize)]
struct StoreRow {
    name: String,
    kind: StoreKind,
    entries: usize,
}

/// Classify a store name against the configured generation
pub fn classify(name: &str, app_id: Option<&AppId>, current: Option<&Generation>) -> StoreKind {
    if current.is_some_and(|g| g.name() == name) {
        return StoreKind::Current;
    }
    match (Generation::parse(name), app_id) {
        (Ok(generation), Some(id)) if &generation.app_id == id => StoreKind::Stale,
        _ => StoreKind::Foreign,
    }
}

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    let storage = DiskStorage::new(config.storage_dir());
    let app_id = config.app_id().ok();
    let current = config.generation().ok();

    let mut rows = vec![];
    for name in storage.keys().await? {
        let kind = classify(&name, app_id.as_ref(), current.as_ref());
        if kind == StoreKind::Foreign && !args.all && app_id.is_some() {
            continue;
        }
        let entries = storage.entries(&name).await?.len();
        rows.push(StoreRow {
            name,
            kind,
            entries,
        });
    }

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(ctx, "No cache stores"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(ctx, &rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

fn print_table(ctx: &UiContext, rows: &[StoreRow]) {
    ui::intro(ctx, "Cache stores");

    println!(
        "{:<48} {:<10} {:>8}",
        style("NAME").bold(),
        style("KIND").bold(),
        style("ENTRIES").bold()
    );
    println!("{}", "-".repeat(68));

    for row in rows {
        let kind = match row.kind {
            StoreKind::Current => style("current").green(),
            StoreKind::Stale => style("stale").yellow(),
            StoreKind::Foreign => style("foreign").dim(),
        };
        println!("{:<48} {:<10} {:>8}", row.name, kind, row.entries);
    }

    println!();
    println!("{} store(s)", rows.len());
}
