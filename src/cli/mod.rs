//! Command-line host for the cache agent

pub mod args;
pub mod commands;
pub mod host;
pub mod registration;

pub use args::{Cli, Commands};
