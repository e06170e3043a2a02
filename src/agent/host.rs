//! The host environment the agent runs in
//!
//! The agent asks its host for two things: to skip the "wait until every
//! client view has closed" deferral, and to hand it control of the client
//! views that are already open.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Host-side controls available to the agent
#[async_trait]
pub trait Host: Send + Sync {
    /// Let the installed generation activate without waiting for clients to close
    fn skip_waiting(&self);

    /// Take control of every open client view. Returns how many were claimed.
    async fn claim_clients(&self) -> usize;
}

/// Host state kept in process
///
/// Records the skip-waiting request so the host loop can act on it, and
/// pretends a fixed number of client views are open.
#[derive(Debug, Default)]
pub struct LocalHost {
    skip_waiting: AtomicBool,
    open_clients: usize,
    claimed: AtomicUsize,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with `count` client views open
    pub fn with_clients(count: usize) -> Self {
        Self {
            open_clients: count,
            ..Self::default()
        }
    }

    /// Whether the agent asked to skip waiting since the last reset
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn reset_skip_waiting(&self) {
        self.skip_waiting.store(false, Ordering::SeqCst);
    }

    /// Number of client views currently controlled by the agent
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Host for LocalHost {
    fn skip_waiting(&self) {
        debug!("Skip-waiting requested");
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> usize {
        self.claimed.store(self.open_clients, Ordering::SeqCst);
        self.open_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_waiting_flag() {
        let host = LocalHost::new();
        assert!(!host.skip_waiting_requested());
        host.skip_waiting();
        assert!(host.skip_waiting_requested());
        host.reset_skip_waiting();
        assert!(!host.skip_waiting_requested());
    }

    #[tokio::test]
    async fn claims_open_clients() {
        let host = LocalHost::with_clients(3);
        assert_eq!(host.claimed(), 0);
        assert_eq!(host.claim_clients().await, 3);
        assert_eq!(host.claimed(), 3);
    }
}
