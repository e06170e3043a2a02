//! Error types for shellcache
//!
//! All modules use `ShellcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellcacheResult<T> = Result<T, ShellcacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellcacheError {
    // Naming errors
    #[error("Invalid app id '{0}': expected ASCII letters, digits or '_'")]
    InvalidAppId(String),

    #[error("Invalid version token '{0}': expected a millisecond timestamp")]
    InvalidVersion(String),

    #[error("Not a cache generation name: {0}")]
    InvalidGenerationName(String),

    // Seed list errors
    #[error("Invalid seed path '{path}': {reason}")]
    InvalidSeedPath { path: String, reason: String },

    #[error("Seed fetch failed for {path}: {reason}")]
    SeedFetch { path: String, reason: String },

    #[error("Seed fetch for {path} returned status {status}")]
    SeedStatus { path: String, status: u16 },

    // Lifecycle errors
    #[error("Cannot {event} while agent is {state}")]
    InvalidTransition { event: String, state: String },

    #[error("No generation is waiting to activate for app {0}")]
    NothingWaiting(String),

    // Storage errors
    #[error("Cache store {name}: {reason}")]
    Storage { name: String, reason: String },

    #[error("Cache entry is corrupt in {name}: {reason}")]
    CorruptEntry { name: String, reason: String },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Missing configuration value: {0}")]
    ConfigMissing(&'static str),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShellcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a storage error for a named cache store
    pub fn storage(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a hard network failure
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is a transport-level network failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }


    /// Whether retrying the same operation may succeed
    ///
    /// Seed, network and storage failures are transient; an install that
    /// hit one fetches everything again on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::SeedFetch { .. }
                | Self::SeedStatus { .. }
                | Self::Storage { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigMissing("agent.app_id") => Some("Run: shellcache config init"),
            Self::ConfigMissing("agent.version") => {
                Some("Set agent.version to the build timestamp (milliseconds)")
            }
            Self::NothingWaiting(_) => Some("Run: shellcache install"),
            Self::SeedFetch { .. } | Self::SeedStatus { .. } => {
                Some("Check that every seed path is served by the origin")
            }
            Self::InvalidTransition { .. } => Some("Run: shellcache status"),
            _ => None,
        }
    }
}
