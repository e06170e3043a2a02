//! Network access for the agent
//!
//! `Network::fetch` returns `Err` only for hard transport failures
//! (DNS, refused connection, reset, TLS). Every HTTP status, including
//! 4xx and 5xx, comes back as an `Ok` response so the agent can tell
//! "the server answered" apart from "the network is gone".

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use tracing::debug;

/// Upper bound on a single response body read from the network
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Outgoing network interface
#[async_trait]
pub trait Network: Send + Sync {
    /// Issue a request. No timeout is applied.
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response>;
}

/// HTTP network backed by a blocking `ureq` agent
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
}

impl HttpNetwork {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }

    fn fetch_blocking(agent: &ureq::Agent, request: &Request) -> ShellcacheResult<Response> {
        let url = request.url.to_string();

        let http_request = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(url.as_str())
            .body(())
            .map_err(|e| ShellcacheError::network(&url, e))?;

        let mut response = agent
            .run(http_request)
            .map_err(|e| ShellcacheError::network(&url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| ShellcacheError::network(&url, e))?;

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}

impl Default for HttpNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        debug!("{} {}", request.method, request.url);

        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &request))
            .await
            .map_err(|e| ShellcacheError::Internal(format!("network task failed: {}", e)))?
    }
}
