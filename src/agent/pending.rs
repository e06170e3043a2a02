//! Handles for asynchronous work started by event handlers
//!
//! Every handler spawns its work before doing anything else and hands the
//! caller a [`PendingWork`] to await. Write-backs after a network response
//! are detached from the response but still tracked in [`WriteBacks`], so
//! a host (or a test) can wait for them to land.

use crate::error::{ShellcacheError, ShellcacheResult};
use std::future::Future;
use std::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::warn;

/// Work registered for one event
#[derive(Debug)]
pub struct PendingWork<T> {
    label: &'static str,
    handle: JoinHandle<ShellcacheResult<T>>,
}

impl<T: Send + 'static> PendingWork<T> {
    pub(crate) fn spawn<F>(label: &'static str, work: F) -> Self
    where
        F: Future<Output = ShellcacheResult<T>> + Send + 'static,
    {
        Self {
            label,
            handle: tokio::spawn(work),
        }
    }

    /// Wait for the work to finish
    pub async fn wait(self) -> ShellcacheResult<T> {
        self.handle.await.map_err(|e| {
            ShellcacheError::Internal(format!("{} task did not complete: {}", self.label, e))
        })?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Detached cache writes that nobody waits on by default
#[derive(Debug, Default)]
pub(crate) struct WriteBacks {
    tasks: Mutex<JoinSet<()>>,
}

impl WriteBacks {
    pub(crate) fn spawn<F>(&self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while let Some(done) = tasks.try_join_next() {
            if let Err(e) = done {
                warn!("Cache write-back task failed: {}", e);
            }
        }
        tasks.spawn(write);
    }

    /// Write-backs still tracked (running, or finished since the last spawn)
    pub(crate) fn tracked(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Wait until every write-back spawned so far (and any spawned while
    /// waiting) has finished. Returns how many were still tracked.
    pub(crate) async fn settle(&self) -> usize {
        let mut settled = 0;
        loop {
            let mut batch = std::mem::take(
                &mut *self
                    .tasks
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            );
            if batch.is_empty() {
                return settled;
            }
            while let Some(result) = batch.join_next().await {
                settled += 1;
                if let Err(e) = result {
                    warn!("Cache write-back task failed: {}", e);
                }
            }
        }
    }
}
