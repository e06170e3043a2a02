//! The cache lifecycle agent
//!
//! One agent owns one cache generation. The host drives it through
//! install, activate, fetch and message events; each handler registers
//! its async work immediately and returns a handle to it.

use crate::agent::host::Host;
use crate::agent::lifecycle::{LifecycleState, LifecycleStep};
use crate::agent::message::AgentMessage;
use crate::agent::pending::{PendingWork, WriteBacks};
use crate::cache::{CacheStorage, Generation};
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::seed::SeedList;
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use url::{Origin, Url};

/// Everything embedded into an agent at build time
#[derive(Debug, Clone)]
pub struct AgentManifest {
    pub generation: Generation,
    /// Base URL of the origin the agent is scoped to
    pub origin: Url,
    pub seeds: SeedList,
}

/// Where a fetch response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Offline document served after a network failure
    Fallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Response produced for an intercepted request
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// What the agent does with a request
#[derive(Debug)]
pub enum FetchDisposition {
    /// Not intercepted; the host sends the request itself
    Passthrough,
    /// Intercepted; the response comes from this work
    Respond(PendingWork<Served>),
}

impl FetchDisposition {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }
}

/// Result of a successful install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub generation: String,
    pub cached: usize,
    /// The store already existed before install (possible version collision)
    pub reused_store: bool,
}

/// Result of an activation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed; retried on the next activation
    pub failed: Vec<String>,
    pub clients_claimed: usize,
}

struct Inner {
    generation: Generation,
    origin_url: Url,
    origin: Origin,
    seeds: SeedList,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    state: Mutex<LifecycleState>,
    write_backs: WriteBacks,
}

/// Cache lifecycle agent for one generation
#[derive(Clone)]
pub struct CacheAgent {
    inner: Arc<Inner>,
}

impl CacheAgent {
    /// Create an agent that has not been installed yet
    pub fn new(
        manifest: AgentManifest,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn Host>,
    ) -> Self {
        Self::restore(manifest, storage, network, host, LifecycleState::Uninstalled)
    }

    /// Re-attach to a generation the host recorded in `state` earlier,
    /// e.g. an installed generation still waiting, or the active one
    pub fn restore(
        manifest: AgentManifest,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn Host>,
        state: LifecycleState,
    ) -> Self {
        let origin = manifest.origin.origin();
        Self {
            inner: Arc::new(Inner {
                generation: manifest.generation,
                origin_url: manifest.origin,
                origin,
                seeds: manifest.seeds,
                storage,
                network,
                host,
                state: Mutex::new(state),
                write_backs: WriteBacks::default(),
            }),
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.inner.generation
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LifecycleState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn advance(&self, step: LifecycleStep) -> ShellcacheResult<LifecycleState> {
        let mut state = self.lock_state();
        *state = state.next(step)?;
        Ok(*state)
    }

    /// Mark this generation as replaced by a newer one
    pub fn retire(&self) -> ShellcacheResult<()> {
        self.advance(LifecycleStep::Superseded)?;
        info!("Generation {} superseded", self.inner.generation);
        Ok(())
    }

    // ---- install ----

    /// Seed the generation's store with every seed path, all or nothing
    pub fn install(&self) -> PendingWork<InstallReport> {
        let agent = self.clone();
        PendingWork::spawn("install", async move { agent.run_install().await })
    }

    async fn run_install(&self) -> ShellcacheResult<InstallReport> {
        self.advance(LifecycleStep::InstallStarted)?;
        info!("Installing generation {}", self.inner.generation);

        match self.seed_store().await {
            Ok(report) => {
                self.advance(LifecycleStep::InstallSucceeded)?;
                info!(
                    "Cached {} seed paths into {}",
                    report.cached, report.generation
                );
                self.inner.host.skip_waiting();
                Ok(report)
            }
            Err(e) => {
                error!("Install of {} failed: {}", self.inner.generation, e);
                self.advance(LifecycleStep::InstallFailed)?;
                Err(e)
            }
        }
    }

    async fn seed_store(&self) -> ShellcacheResult<InstallReport> {
        let storage = &self.inner.storage;
        let name = self.inner.generation.name();

        let existed = storage.open(&name).await?;
        if existed {
            let held = storage.entries(&name).await?.len();
            if held > 0 {
                warn!(
                    "Cache store {} already holds {} entries; another build may share this version token",
                    name, held
                );
            }
        }

        let seeded = async {
            let fetched =
                try_join_all(self.inner.seeds.paths().iter().map(|p| self.fetch_seed(p))).await?;
            try_join_all(
                fetched
                    .into_iter()
                    .map(|(key, response)| {
                        let name = &name;
                        async move { storage.put(name, &key, response).await }
                    }),
            )
            .await
        };

        if let Err(e) = seeded.await {
            if !existed {
                if let Err(cleanup) = storage.delete(&name).await {
                    warn!("Could not remove partial store {}: {}", name, cleanup);
                }
            }
            return Err(e);
        }

        Ok(InstallReport {
            generation: name,
            cached: self.inner.seeds.len(),
            reused_store: existed,
        })
    }

    async fn fetch_seed(&self, path: &str) -> ShellcacheResult<(String, Response)> {
        let url = self.resolve(path)?;
        let request = Request::get(url);

        let response = self
            .inner
            .network
            .fetch(&request)
            .await
            .map_err(|e| ShellcacheError::SeedFetch {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(ShellcacheError::SeedStatus {
                path: path.to_string(),
                status: response.status,
            });
        }

        Ok((request.cache_key(), response))
    }

    fn resolve(&self, path: &str) -> ShellcacheResult<Url> {
        self.inner
            .origin_url
            .join(path)
            .map_err(|source| ShellcacheError::InvalidUrl {
                input: path.to_string(),
                source,
            })
    }

    // ---- activate ----

    /// Delete stale generations of this app and take control of open clients
    pub fn activate(&self) -> PendingWork<ActivateReport> {
        let agent = self.clone();
        PendingWork::spawn("activate", async move { agent.run_activate().await })
    }

    async fn run_activate(&self) -> ShellcacheResult<ActivateReport> {
        self.advance(LifecycleStep::ActivateStarted)?;
        info!("Activating generation {}", self.inner.generation);

        let storage = &self.inner.storage;
        let names = match storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not list cache stores, skipping cleanup: {}", e);
                vec![]
            }
        };

        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| self.inner.generation.is_stale_sibling(name))
            .collect();

        let outcomes = join_all(stale.into_iter().map(|name| async move {
            info!("Deleting old cache: {}", name);
            let outcome = storage.delete(&name).await;
            (name, outcome)
        }))
        .await;

        let mut report = ActivateReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(_) => report.deleted.push(name),
                Err(e) => {
                    warn!("Failed to delete old cache {}: {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        self.advance(LifecycleStep::ActivateCompleted)?;
        report.clients_claimed = self.inner.host.claim_clients().await;
        info!(
            "Activated {} ({} old caches deleted, {} clients claimed)",
            self.inner.generation,
            report.deleted.len(),
            report.clients_claimed
        );
        Ok(report)
    }

    // ---- fetch ----

    /// Decide whether to intercept a request, and if so start answering it
    ///
    /// Only same-origin GET requests are intercepted, and only while this
    /// generation is active.
    pub fn fetch(&self, request: Request) -> FetchDisposition {
        if !request.method.is_read_only() {
            debug!("Passing through {} {}", request.method, request.url);
            return FetchDisposition::Passthrough;
        }
        if request.origin() != self.inner.origin {
            debug!("Passing through cross-origin {}", request.url);
            return FetchDisposition::Passthrough;
        }
        if !self.state().is_controlling() {
            debug!("Passing through {}: agent is {}", request.url, self.state());
            return FetchDisposition::Passthrough;
        }

        let agent = self.clone();
        FetchDisposition::Respond(PendingWork::spawn("fetch", async move {
            agent.respond(request).await
        }))
    }

    async fn respond(&self, request: Request) -> ShellcacheResult<Served> {
        let name = self.inner.generation.name();
        let key = request.cache_key();

        match self.inner.storage.lookup(&name, &key).await {
            Ok(Some(response)) => {
                debug!("Serving from cache: {}", request.url);
                return Ok(Served {
                    response,
                    source: ResponseSource::Cache,
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
        }

        debug!("Fetching from network: {}", request.url);
        match self.inner.network.fetch(&request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.write_back(key, response.clone());
                }
                Ok(Served {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(e) => {
                error!("Fetch failed: {}", e);
                match self.offline_document().await {
                    Some(response) => Ok(Served {
                        response,
                        source: ResponseSource::Fallback,
                    }),
                    None => Err(e),
                }
            }
        }
    }

    fn write_back(&self, key: String, response: Response) {
        let storage = self.inner.storage.clone();
        let name = self.inner.generation.name();
        self.inner.write_backs.spawn(async move {
            match storage.put(&name, &key, response).await {
                Ok(()) => debug!("Cached {}", key),
                Err(e) => warn!("Cache write for {} failed: {}", key, e),
            }
        });
    }

    async fn offline_document(&self) -> Option<Response> {
        let path = self.inner.generation.app_id.fallback_path();
        let url = self.resolve(&path).ok()?;
        let key = Request::get(url).cache_key();

        match self
            .inner
            .storage
            .lookup(&self.inner.generation.name(), &key)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Offline document lookup failed: {}", e);
                None
            }
        }
    }

    /// Wait for every write-back started so far. Returns how many finished.
    pub async fn settle_write_backs(&self) -> usize {
        self.inner.write_backs.settle().await
    }

    // ---- message ----

    /// Handle a control message. Returns true if it was recognized.
    pub fn message(&self, payload: &serde_json::Value) -> bool {
        match AgentMessage::parse(payload) {
            Some(AgentMessage::SkipWaiting) => {
                info!("Skip-waiting requested by message");
                self.inner.host.skip_waiting();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for CacheAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheAgent")
            .field("generation", &self.inner.generation.name())
            .field("origin", &self.inner.origin_url.as_str())
            .field("state", &self.state())
            .field("write_backs", &self.inner.write_backs.tracked())
            .finish()
    }
}
