//! In-memory cache storage

use crate::cache::store::CacheStorage;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::Response;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

type Store = BTreeMap<String, Response>;

/// Cache storage held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<BTreeMap<String, Store>>,
    /// Store names whose writes and deletes fail
    failing: RwLock<BTreeSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write or delete against `name` fail
    pub async fn fail_writes_to(&self, name: &str) {
        self.failing.write().await.insert(name.to_string());
    }

    /// Allow writes to `name` again
    pub async fn heal(&self, name: &str) {
        self.failing.write().await.remove(name);
    }

    async fn check_writable(&self, name: &str) -> ShellcacheResult<()> {
        if self.failing.read().await.contains(name) {
            return Err(ShellcacheError::storage(name, "store is not writable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn open(&self, name: &str) -> ShellcacheResult<bool> {
        if self.stores.read().await.contains_key(name) {
            return Ok(true);
        }

        self.check_writable(name).await?;
        self.stores
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(false)
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        self.check_writable(name).await?;
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn lookup(&self, name: &str, key: &str) -> ShellcacheResult<Option<Response>> {
        Ok(self
            .stores
            .read()
            .await
            .get(name)
            .and_then(|store| store.get(key))
            .cloned())
    }

    async fn put(&self, name: &str, key: &str, response: Response) -> ShellcacheResult<()> {
        self.check_writable(name).await?;
        self.stores
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>> {
        Ok(self
            .stores
            .read()
            .await
            .get(name)
            .map(|store| store.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_once() {
        let storage = MemoryStorage::new();
        assert!(!storage.open("s1").await.unwrap());
        assert!(storage.open("s1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn put_replaces_and_lookup_finds() {
        let storage = MemoryStorage::new();
        storage
            .put("s1", "GET https://p.test/a", Response::new("https://p.test/a", 200, "one"))
            .await
            .unwrap();
        storage
            .put("s1", "GET https://p.test/a", Response::new("https://p.test/a", 200, "two"))
            .await
            .unwrap();

        let hit = storage.lookup("s1", "GET https://p.test/a").await.unwrap().unwrap();
        assert_eq!(hit.body, b"two");
        assert!(storage.lookup("s2", "GET https://p.test/a").await.unwrap().is_none());
        assert_eq!(storage.entries("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let storage = MemoryStorage::new();
        storage.open("s1").await.unwrap();
        assert!(storage.delete("s1").await.unwrap());
        assert!(!storage.delete("s1").await.unwrap());
        assert!(!storage.has("s1").await.unwrap());
    }

    #[tokio::test]
    async fn injected_failures() {
        let storage = MemoryStorage::new();
        storage.open("s1").await.unwrap();
        storage.fail_writes_to("s1").await;

        assert!(storage.delete("s1").await.is_err());
        assert!(storage.put("s1", "k", Response::new("u", 200, "")).await.is_err());
        assert!(storage.has("s1").await.unwrap());

        storage.heal("s1").await;
        assert!(storage.delete("s1").await.unwrap());
    }
}
