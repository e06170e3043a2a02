//! Status command - show the configured generation and its registration

use crate::cache::{CacheStorage, DiskStorage};
use crate::cli::registration::Registration;
use crate::config::{Config, ConfigManager};
use crate::error::ShellcacheResult;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    ui::intro(ctx, "Shellcache Status");

    ui::section(ctx, "Agent");
    let app_id = match config.app_id() {
        Ok(id) => id,
        Err(e) => {
            ui::step_warn_hint(ctx, &e.to_string(), e.hint().unwrap_or("Check agent.app_id"));
            return Ok(());
        }
    };
    ui::key_value(ctx, "app", app_id.as_str());
    ui::key_value(ctx, "origin", &config.agent.origin);

    match config.seed_list().await {
        Ok(seeds) => ui::key_value(ctx, "seed paths", &seeds.len().to_string()),
        Err(e) => ui::step_warn(ctx, &e.to_string()),
    }

    let generation = match config.generation() {
        Ok(generation) => generation,
        Err(e) => {
            ui::step_warn_hint(ctx, &e.to_string(), e.hint().unwrap_or("Check agent.version"));
            return Ok(());
        }
    };
    let name = generation.name();
    ui::key_value(ctx, "generation", &name);

    ui::section(ctx, "Storage");
    let storage = DiskStorage::new(config.storage_dir());
    ui::key_value(ctx, "dir", &storage.root().display().to_string());
    if storage.has(&name).await? {
        let entries = storage.entries(&name).await?.len();
        ui::key_value_status(ctx, "store", &format!("{} entries", entries), true);
    } else {
        ui::key_value_status(ctx, "store", "not installed", false);
    }

    ui::section(ctx, "Registration");
    let registration =
        Registration::load(&ConfigManager::registrations_dir(), &app_id).await?;
    let state = registration.state_of(&generation);
    ui::key_value_status(ctx, "state", &state.to_string(), state.is_controlling());
    ui::key_value(
        ctx,
        "active",
        registration.active.as_deref().unwrap_or("none"),
    );
    ui::key_value(
        ctx,
        "waiting",
        registration.waiting.as_deref().unwrap_or("none"),
    );
    ui::key_value(
        ctx,
        "updated",
        &registration.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );

    Ok(())
}
