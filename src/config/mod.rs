//! Configuration management for shellcache

pub mod schema;

pub use schema::Config;

use crate::agent::AgentManifest;
use crate::cache::{AppId, Generation, VersionToken};
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::parse_url;
use crate::seed::SeedList;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Overrides the state directory (used by tests and sandboxed hosts)
pub const STATE_DIR_ENV: &str = "SHELLCACHE_STATE_DIR";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(STATE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
    }

    /// Get the default cache storage directory
    pub fn caches_dir() -> PathBuf {
        Self::state_dir().join("caches")
    }

    /// Get the host registrations directory
    pub fn registrations_dir() -> PathBuf {
        Self::state_dir().join("registrations")
    }

    /// Get the audit log path
    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> ShellcacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ShellcacheResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellcacheError::io(format!("reading config from {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| ShellcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShellcacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShellcacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ShellcacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellcacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure all state directories exist
    pub async fn ensure_state_dirs() -> ShellcacheResult<()> {
        for dir in [Self::state_dir(), Self::registrations_dir()] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                ShellcacheError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Validated app id
    pub fn app_id(&self) -> ShellcacheResult<AppId> {
        let id = self
            .agent
            .app_id
            .as_deref()
            .ok_or(ShellcacheError::ConfigMissing("agent.app_id"))?;
        AppId::new(id)
    }

    /// Generation named by the configured app id and version
    pub fn generation(&self) -> ShellcacheResult<Generation> {
        let app_id = self.app_id()?;
        let version = self
            .agent
            .version
            .ok_or(ShellcacheError::ConfigMissing("agent.version"))?;
        Ok(Generation::new(app_id, VersionToken::new(version)))
    }

    /// Cache storage directory
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::caches_dir)
    }

    /// Seed list from `seed_file` if set, otherwise from inline `seeds`
    pub async fn seed_list(&self) -> ShellcacheResult<SeedList> {
        let app_id = self.app_id()?;
        match &self.agent.seed_file {
            Some(path) => SeedList::load(&app_id, path).await,
            None => SeedList::from_paths(&app_id, self.agent.seeds.iter().cloned()),
        }
    }

    /// Everything the agent is built with
    pub async fn manifest(&self) -> ShellcacheResult<AgentManifest> {
        Ok(AgentManifest {
            generation: self.generation()?,
            origin: parse_url(&self.agent.origin)?,
            seeds: self.seed_list().await?,
        })
    }
}
