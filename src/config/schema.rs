//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// What the agent is built with: app, origin, version, seeds
    pub agent: AgentConfig,

    /// Cache storage settings
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging of lifecycle events
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { audit_log: true }
    }
}

/// Build-time inputs of the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Application identifier
    pub app_id: Option<String>,

    /// Origin the agent is scoped to
    pub origin: String,

    /// Build timestamp in milliseconds; names the cache generation
    pub version: Option<u64>,

    /// Seed paths, inline
    pub seeds: Vec<String>,

    /// JSON file with seed paths; used instead of `seeds` when set
    pub seed_file: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            origin: "https://pufferfishes.net".to_string(),
            version: None,
            seeds: vec![],
            seed_file: None,
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding cache stores (defaults to the state dir)
    pub dir: Option<PathBuf>,
}
