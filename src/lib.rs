//! Shellcache - offline cache agent for per-app shells
//!
//! Each build of an app installs a versioned cache generation seeded with
//! the app's shell. The active generation answers same-origin GETs
//! cache-first, writes successful network responses back, and falls back
//! to the app's offline document when the network is gone.

pub mod agent;
pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod seed;
pub mod ui;

pub use error::{ShellcacheError, ShellcacheResult};
