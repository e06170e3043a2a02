//! Install-time seed list
//!
//! The full asset list of a build is produced elsewhere. The agent only
//! receives the first [`MAX_SEED_PATHS`] entries as the paths it fetches
//! and stores on install.

use crate::cache::AppId;
use crate::error::{ShellcacheError, ShellcacheResult};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Maximum number of paths seeded on install
pub const MAX_SEED_PATHS: usize = 50;

/// Ordered, bounded list of root-relative asset paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedList {
    paths: Vec<String>,
}

impl SeedList {
    /// Build a seed list for an app
    ///
    /// Every path must be root-relative and under `/apps/<app-id>/`.
    /// Duplicates keep their first position. Only the first
    /// [`MAX_SEED_PATHS`] distinct paths are kept.
    pub fn from_paths<I, S>(app_id: &AppId, paths: I) -> ShellcacheResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = app_id.scope();
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        let mut total = 0usize;

        for path in paths {
            let path = path.into();
            validate_path(&path, &scope)?;

            if !seen.insert(path.clone()) {
                debug!("Dropping duplicate seed path {}", path);
                continue;
            }
            total += 1;
            if kept.len() < MAX_SEED_PATHS {
                kept.push(path);
            }
        }

        if total > MAX_SEED_PATHS {
            warn!(
                "Seed list has {} paths, keeping the first {}",
                total, MAX_SEED_PATHS
            );
        }

        Ok(Self { paths: kept })
    }

    /// Load a JSON array of paths
    pub async fn load(app_id: &AppId, path: &Path) -> ShellcacheResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading seed list {}", path.display()), e))?;
        let paths: Vec<String> = serde_json::from_str(&content)?;
        Self::from_paths(app_id, paths)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn validate_path(path: &str, scope: &str) -> ShellcacheResult<()> {
    let invalid = |reason: &str| ShellcacheError::InvalidSeedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if !path.starts_with('/') || path.starts_with("//") {
        return Err(invalid("must be root-relative"));
    }
    if !path.starts_with(scope) {
        return Err(invalid(&format!("must be under {}", scope)));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(())
}
