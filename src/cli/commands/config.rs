//! Config command - show or initialize configuration

use crate::cache::VersionToken;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::ShellcacheResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    ctx: &UiContext,
) -> ShellcacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force, ctx).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ShellcacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool, ctx: &UiContext) -> ShellcacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    let config = initial_config(VersionToken::now());
    manager.save(&config).await?;
    ui::step_ok_detail(ctx, "Configuration initialized", &path.display().to_string());
    ui::remark(ctx, "Set agent.app_id and agent.seeds before installing");

    Ok(())
}

/// Default configuration stamped with a build version
fn initial_config(version: VersionToken) -> Config {
    let mut config = Config::default();
    config.agent.version = Some(version.get());
    config
}
