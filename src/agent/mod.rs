//! Cache lifecycle agent
//!
//! The agent runs inside a host that delivers four events:
//!
//! - `install`: open the generation's store and seed it, all or nothing
//! - `activate`: delete older generations of the same app, claim clients
//! - `fetch`: cache-first answer for same-origin GETs, with write-back
//! - `message`: `SKIP_WAITING` asks the host to activate immediately
//!
//! The current generation is fixed when the agent is built and is only
//! read by these handlers; there is no other shared state.

mod event;
mod host;
mod lifecycle;
mod message;
mod pending;
mod worker;

#[cfg(test)]
mod testing;

pub use event::{AgentEvent, EventHandle};
pub use host::{Host, LocalHost};
pub use lifecycle::{LifecycleState, LifecycleStep};
pub use message::AgentMessage;
pub use pending::PendingWork;
pub use worker::{
    ActivateReport, AgentManifest, CacheAgent, FetchDisposition, InstallReport, ResponseSource,
    Served,
};
