//! Fetch command - send a request through the active generation

use crate::agent::FetchDisposition;
use crate::cli::args::FetchArgs;
use crate::cli::host::HostContext;
use crate::config::Config;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Method, Request};
use crate::network::Network;
use crate::ui::{self, UiContext};
use tokio::fs;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config, ctx: &UiContext) -> ShellcacheResult<()> {
    let method: Method = args.method.parse()?;
    let request = Request::parse(method, &args.url)?;

    let host = HostContext::new(config).await?;
    let registration = host.registration().await?;
    let agent = host.agent(registration.state_of(host.generation()));

    let (response, source) = match agent.fetch(request.clone()) {
        FetchDisposition::Respond(work) => {
            let served = work.wait().await?;
            (served.response, served.source.to_string())
        }
        FetchDisposition::Passthrough => {
            debug!("Agent did not intercept {}", request.url);
            (host.network.fetch(&request).await?, "passthrough".to_string())
        }
    };

    let written = agent.settle_write_backs().await;
    debug!("{} write-back(s) settled", written);

    ui::key_value_status(ctx, "status", &response.status.to_string(), response.is_success());
    ui::key_value(ctx, "source", &source);
    ui::key_value(ctx, "bytes", &response.body.len().to_string());

    if let Some(out) = &args.out {
        fs::write(out, &response.body).await.map_err(|e| {
            ShellcacheError::io(format!("writing response body to {}", out.display()), e)
        })?;
        ui::remark(ctx, &format!("Body written to {}", out.display()));
    }

    Ok(())
}
