//! Event surface between host and agent
//!
//! Exactly four events exist. [`CacheAgent::dispatch`] routes each one to
//! its handler and returns the handle the host must hold on to.

use crate::agent::pending::PendingWork;
use crate::agent::worker::{ActivateReport, CacheAgent, FetchDisposition, InstallReport};
use crate::http::Request;
use serde_json::Value;

/// An event delivered by the host
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(Value),
}

/// What the host gets back for an event
#[derive(Debug)]
pub enum EventHandle {
    Install(PendingWork<InstallReport>),
    Activate(PendingWork<ActivateReport>),
    Fetch(FetchDisposition),
    /// Whether the message was recognized
    Message(bool),
}

impl CacheAgent {
    /// Route an event to its handler
    pub fn dispatch(&self, event: AgentEvent) -> EventHandle {
        match event {
            AgentEvent::Install => EventHandle::Install(self.install()),
            AgentEvent::Activate => EventHandle::Activate(self.activate()),
            AgentEvent::Fetch(request) => EventHandle::Fetch(self.fetch(request)),
            AgentEvent::Message(payload) => EventHandle::Message(self.message(&payload)),
        }
    }
}
