//! Cache storage abstraction
//!
//! A storage holds any number of named cache stores; each store maps a
//! request key (method + URL) to a response. Per-key writes are atomic and
//! the last writer wins. Nothing else is coordinated.

use crate::error::ShellcacheResult;
use crate::http::Response;
use async_trait::async_trait;

/// Storage backend for cache generations
///
/// Implementations:
/// - [`MemoryStorage`](super::MemoryStorage): in-process, used by tests
/// - [`DiskStorage`](super::DiskStorage): one directory per store
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all stores currently present
    async fn keys(&self) -> ShellcacheResult<Vec<String>>;

    /// Open a store, creating it if absent. Returns true if it already existed.
    async fn open(&self, name: &str) -> ShellcacheResult<bool>;

    /// Whether a store exists
    async fn has(&self, name: &str) -> ShellcacheResult<bool>;

    /// Delete a store and everything in it. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> ShellcacheResult<bool>;

    /// Exact-key lookup in one store; a missing store is a miss
    async fn lookup(&self, name: &str, key: &str) -> ShellcacheResult<Option<Response>>;

    /// Write an entry, replacing any previous value. Creates the store if absent.
    async fn put(&self, name: &str, key: &str, response: Response) -> ShellcacheResult<()>;

    /// Keys held by one store, sorted
    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>>;
}
