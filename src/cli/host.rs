//! Process-level host wiring for CLI commands
//!
//! Builds the agent on disk storage and the real network, and carries the
//! lifecycle steps the host performs around the agent: recording waiting
//! and active generations, auditing, and activating on request.

use crate::agent::{ActivateReport, AgentManifest, CacheAgent, LifecycleState, LocalHost};
use crate::audit::{AuditLog, LifecycleEvent};
use crate::cache::{DiskStorage, Generation};
use crate::cli::registration::Registration;
use crate::config::{Config, ConfigManager};
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::network::HttpNetwork;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs to drive the agent
pub struct HostContext {
    pub manifest: AgentManifest,
    pub storage: Arc<DiskStorage>,
    pub network: Arc<HttpNetwork>,
    pub host: Arc<LocalHost>,
    pub audit: AuditLog,
    registrations_dir: PathBuf,
}

impl HostContext {
    pub async fn new(config: &Config) -> ShellcacheResult<Self> {
        let manifest = config.manifest().await?;
        let storage_dir = config.storage_dir();
        debug!("Cache storage at {}", storage_dir.display());

        Ok(Self {
            manifest,
            storage: Arc::new(DiskStorage::new(storage_dir)),
            network: Arc::new(HttpNetwork::new()),
            host: Arc::new(LocalHost::new()),
            audit: AuditLog::new(config),
            registrations_dir: ConfigManager::registrations_dir(),
        })
    }

    pub fn generation(&self) -> &Generation {
        &self.manifest.generation
    }

    pub async fn registration(&self) -> ShellcacheResult<Registration> {
        Registration::load(&self.registrations_dir, &self.generation().app_id).await
    }

    pub async fn save_registration(&self, registration: &mut Registration) -> ShellcacheResult<()> {
        registration.save(&self.registrations_dir).await
    }

    /// Agent for the configured generation at the given lifecycle position
    pub fn agent(&self, state: LifecycleState) -> CacheAgent {
        CacheAgent::restore(
            self.manifest.clone(),
            self.storage.clone(),
            self.network.clone(),
            self.host.clone(),
            state,
        )
    }

    /// Activate an installed agent and record the result
    pub async fn activate(
        &self,
        agent: &CacheAgent,
        registration: &mut Registration,
    ) -> ShellcacheResult<ActivateReport> {
        let name = agent.generation().name();
        if agent.state() != LifecycleState::Installed {
            return Err(ShellcacheError::NothingWaiting(
                agent.generation().app_id.to_string(),
            ));
        }

        let report = agent.activate().wait().await?;
        self.host.reset_skip_waiting();

        registration.mark_active(agent.generation());
        self.save_registration(registration).await?;

        for deleted in &report.deleted {
            self.audit
                .record(LifecycleEvent::GenerationDeleted {
                    generation: deleted.clone(),
                })
                .await;
        }
        self.audit
            .record(LifecycleEvent::activated(name, &report))
            .await;

        Ok(report)
    }
}
