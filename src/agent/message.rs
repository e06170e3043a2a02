//! Control messages from the foreground app
//!
//! One command is recognized: `{"type": "SKIP_WAITING"}`. Any other
//! payload is ignored.

use serde::Deserialize;
use serde_json::Value;

/// A recognized control message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum AgentMessage {
    /// Activate this generation without waiting for clients to close
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl AgentMessage {
    /// Recognize a message payload; unknown payloads yield `None`
    pub fn parse(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}
