//! Host-side record of which generation is active or waiting
//!
//! One JSON file per app under the registrations directory. The CLI is a
//! sequence of short-lived processes, so the lifecycle position of a
//! generation has to survive between them.

use crate::agent::LifecycleState;
use crate::cache::{AppId, Generation};
use crate::error::{ShellcacheError, ShellcacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub app_id: AppId,

    /// Name of the generation currently controlling clients
    pub active: Option<String>,

    /// Name of an installed generation not yet activated
    pub waiting: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            active: None,
            waiting: None,
            updated_at: Utc::now(),
        }
    }

    /// Registration file for an app inside `dir`
    pub fn file_path(dir: &Path, app_id: &AppId) -> PathBuf {
        dir.join(format!("{}.json", app_id))
    }

    /// Load the registration for an app, or a blank one if none exists
    pub async fn load(dir: &Path, app_id: &AppId) -> ShellcacheResult<Self> {
        let path = Self::file_path(dir, app_id);

        if !path.exists() {
            return Ok(Self::new(app_id.clone()));
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            ShellcacheError::io(format!("reading registration {}", path.display()), e)
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&mut self, dir: &Path) -> ShellcacheResult<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ShellcacheError::io("creating registrations directory", e))?;

        self.updated_at = Utc::now();
        let path = Self::file_path(dir, &self.app_id);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).await.map_err(|e| {
            ShellcacheError::io(format!("writing registration {}", path.display()), e)
        })?;

        Ok(())
    }

    pub fn mark_waiting(&mut self, generation: &Generation) {
        self.waiting = Some(generation.name());
    }

    /// Record `generation` as active; it is no longer waiting
    pub fn mark_active(&mut self, generation: &Generation) {
        let name = generation.name();
        if self.waiting.as_deref() == Some(name.as_str()) {
            self.waiting = None;
        }
        self.active = Some(name);
    }

    /// Where `generation` stands according to this record
    pub fn state_of(&self, generation: &Generation) -> LifecycleState {
        let name = generation.name();
        if self.active.as_deref() == Some(name.as_str()) {
            LifecycleState::Active
        } else if self.waiting.as_deref() == Some(name.as_str()) {
            LifecycleState::Installed
        } else {
            LifecycleState::Uninstalled
        }
    }
}
