//! Audit trail of generation lifecycle events
//!
//! One JSON object per line in `<state-dir>/audit.log`, tagged by `event`.
//! Writing the trail never fails the lifecycle step being recorded.

use crate::agent::{ActivateReport, InstallReport};
use crate::config::{schema::Config, ConfigManager};
use crate::error::ShellcacheError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Something that happened to a cache generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Installed {
        generation: String,
        cached: usize,
        reused_store: bool,
    },
    InstallFailed {
        generation: String,
        error: String,
        retryable: bool,
    },
    Activated {
        generation: String,
        deleted: usize,
        failed: Vec<String>,
        clients_claimed: usize,
    },
    GenerationDeleted {
        generation: String,
    },
    SkipWaiting {
        generation: String,
    },
}

impl LifecycleEvent {
    pub fn installed(report: &InstallReport) -> Self {
        Self::Installed {
            generation: report.generation.clone(),
            cached: report.cached,
            reused_store: report.reused_store,
        }
    }

    pub fn install_failed(generation: impl Into<String>, error: &ShellcacheError) -> Self {
        Self::InstallFailed {
            generation: generation.into(),
            error: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    pub fn activated(generation: impl Into<String>, report: &ActivateReport) -> Self {
        Self::Activated {
            generation: generation.into(),
            deleted: report.deleted.len(),
            failed: report.failed.clone(),
            clients_claimed: report.clients_claimed,
        }
    }
}

#[derive(Serialize)]
struct AuditLine<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a LifecycleEvent,
}

/// Append-only lifecycle trail; `None` path means auditing is off
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(config: &Config) -> Self {
        if config.general.audit_log {
            Self::at(ConfigManager::audit_log_path())
        } else {
            Self::disabled()
        }
    }

    /// Trail written to an explicit file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub async fn record(&self, event: LifecycleEvent) {
        let Some(path) = &self.path else {
            return;
        };

        let line = AuditLine {
            at: Utc::now(),
            event: &event,
        };
        match serde_json::to_string(&line) {
            Ok(json) => {
                if let Err(e) = append_line(path, &json).await {
                    warn!("Audit trail {} not written: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Audit event {:?} not serializable: {}", event, e),
        }
    }
}

async fn append_line(path: &Path, json: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}\n", json).as_bytes()).await
}
