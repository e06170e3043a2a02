//! Message command - deliver a JSON message to the agent

use crate::agent::LifecycleState;
use crate::audit::LifecycleEvent;
use crate::cli::args::MessageArgs;
use crate::cli::commands::install::print_activation;
use crate::cli::host::HostContext;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::ui::{self, UiContext};
use serde_json::Value;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    let payload: Value = serde_json::from_str(&args.payload)?;

    let host = HostContext::new(config).await?;
    let mut registration = host.registration().await?;
    let agent = host.agent(registration.state_of(host.generation()));

    if !agent.message(&payload) {
        ui::remark(ctx, "Message ignored");
        return Ok(());
    }

    host.audit
        .record(LifecycleEvent::SkipWaiting {
            generation: agent.generation().name(),
        })
        .await;

    if !host.host.skip_waiting_requested() || agent.state() != LifecycleState::Installed {
        ui::step_info(ctx, "Nothing waiting to activate");
        return Ok(());
    }

    let report = host.activate(&agent, &mut registration).await?;
    print_activation(ctx, &agent.generation().name(), &report);
    Ok(())
}
