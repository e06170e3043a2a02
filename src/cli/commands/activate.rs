//! Activate command - promote the waiting generation

use crate::cache::CacheStorage;
use crate::cli::commands::install::print_activation;
use crate::cli::host::HostContext;
use crate::config::Config;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::ui::UiContext;
use tracing::warn;

/// Execute the activate command
pub async fn execute(config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    let host = HostContext::new(config).await?;
    let mut registration = host.registration().await?;
    let generation = host.generation().clone();
    let name = generation.name();

    if registration.waiting.as_deref() != Some(name.as_str()) {
        return Err(ShellcacheError::NothingWaiting(generation.app_id.to_string()));
    }

    if !host.storage.has(&name).await? {
        warn!("Waiting generation {} has no store; dropping it", name);
        registration.waiting = None;
        host.save_registration(&mut registration).await?;
        return Err(ShellcacheError::NothingWaiting(generation.app_id.to_string()));
    }

    let agent = host.agent(registration.state_of(&generation));
    let report = host.activate(&agent, &mut registration).await?;
    print_activation(ctx, &name, &report);
    Ok(())
}
