//! Shellcache CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shellcache::cli::{commands, Cli, Commands};
use shellcache::config::ConfigManager;
use shellcache::error::ShellcacheResult;
use shellcache::ui::UiContext;
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

async fn run() -> ShellcacheResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    debug!("Using config {}", config_manager.path().display());

    let config = config_manager.load().await?;
    ConfigManager::ensure_state_dirs().await?;

    let ctx = UiContext::detect().with_plain(cli.json_logs);

    match cli.command {
        Commands::Install(args) => commands::install(args, &config, &ctx).await,
        Commands::Activate => commands::activate(&config, &ctx).await,
        Commands::Fetch(args) => commands::fetch(args, &config, &ctx).await,
        Commands::Message(args) => commands::message(args, &config, &ctx).await,
        Commands::List(args) => commands::list(args, &config, &ctx).await,
        Commands::Status => commands::status(&config, &ctx).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager, &ctx).await,
    }
}
