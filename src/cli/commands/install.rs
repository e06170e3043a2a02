//! Install command - seed the configured generation

use crate::agent::{ActivateReport, LifecycleState};
use crate::audit::LifecycleEvent;
use crate::cli::args::InstallArgs;
use crate::cli::host::HostContext;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::ui::{self, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    let host = HostContext::new(config).await?;
    let mut registration = host.registration().await?;
    let agent = host.agent(LifecycleState::Uninstalled);
    let name = agent.generation().name();

    let report = match agent.install().wait().await {
        Ok(report) => report,
        Err(e) => {
            host.audit
                .record(LifecycleEvent::install_failed(&name, &e))
                .await;
            if e.is_retryable() {
                ui::remark(ctx, "Nothing was kept; the install can be retried as is");
            }
            return Err(e);
        }
    };

    host.audit.record(LifecycleEvent::installed(&report)).await;

    registration.mark_waiting(agent.generation());
    host.save_registration(&mut registration).await?;

    ui::step_ok_detail(
        ctx,
        &format!("Installed {}", name),
        &format!("{} seed paths", report.cached),
    );
    if report.reused_store {
        ui::step_warn_hint(
            ctx,
            "Store already existed before install",
            "Another build may share this version token",
        );
    }

    if args.no_activate || !host.host.skip_waiting_requested() {
        ui::remark(ctx, "Generation is waiting. Run: shellcache activate");
        return Ok(());
    }

    let report = host.activate(&agent, &mut registration).await?;
    print_activation(ctx, &name, &report);
    Ok(())
}

pub(crate) fn print_activation(ctx: &UiContext, name: &str, report: &ActivateReport) {
    ui::step_ok_detail(
        ctx,
        &format!("Activated {}", name),
        &format!("{} client(s) claimed", report.clients_claimed),
    );
    for deleted in &report.deleted {
        ui::remark(ctx, &format!("Deleted stale generation {}", deleted));
    }
    for failed in &report.failed {
        ui::step_warn_hint(
            ctx,
            &format!("Could not delete {}", failed),
            "Retried on the next activation",
        );
    }
}
