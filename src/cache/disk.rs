//! Disk-backed cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<store-name>/<sha256(key)[..32]>.json
//! ```
//!
//! Each entry file holds the key and the response. Writes go to a temp
//! file first and are renamed into place, so a concurrent reader sees
//! either the old entry or the new one.

use crate::cache::store::CacheStorage;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

/// Distinguishes temp files of concurrent writes to the same key
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// On-disk representation of one cache entry
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    key: String,
    response: Response,
}

/// Cache storage rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> ShellcacheResult<PathBuf> {
        // Store names become directory names
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            return Err(ShellcacheError::storage(name, "invalid store name"));
        }
        Ok(self.root.join(name))
    }

    fn entry_file_name(key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        format!("{}.json", hex::encode(&digest[..16]))
    }

    async fn read_entry(&self, name: &str, path: &Path) -> ShellcacheResult<Option<EntryFile>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellcacheError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ShellcacheError::CorruptEntry {
                name: name.to_string(),
                reason: format!("{}: {}", path.display(), e),
            })
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellcacheError::io("reading cache storage directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io("reading cache storage entry", e))?
        {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn open(&self, name: &str) -> ShellcacheResult<bool> {
        let dir = self.store_dir(name)?;
        if dir.is_dir() {
            return Ok(true);
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("creating cache store {}", dir.display()), e))?;
        debug!("Created cache store {}", name);
        Ok(false)
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.store_dir(name)?.is_dir())
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        let dir = self.store_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellcacheError::storage(name, e)),
        }
    }

    async fn lookup(&self, name: &str, key: &str) -> ShellcacheResult<Option<Response>> {
        let path = self.store_dir(name)?.join(Self::entry_file_name(key));
        let entry = self.read_entry(name, &path).await?;

        // Hash prefix collisions fall through as a miss
        Ok(entry.filter(|e| e.key == key).map(|e| e.response))
    }

    async fn put(&self, name: &str, key: &str, response: Response) -> ShellcacheResult<()> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::storage(name, e))?;

        let file_name = Self::entry_file_name(key);
        let path = dir.join(&file_name);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".{}.{}-{}.tmp", file_name, std::process::id(), seq));

        let content = serde_json::to_string(&EntryFile {
            key: key.to_string(),
            response,
        })?;

        fs::write(&tmp, content)
            .await
            .map_err(|e| ShellcacheError::storage(name, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ShellcacheError::storage(name, e));
        }
        Ok(())
    }

    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>> {
        let dir = self.store_dir(name)?;
        if !dir.is_dir() {
            return Ok(vec![]);
        }

        let mut keys = vec![];
        let mut files = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading cache store {}", name), e))?;

        while let Some(file) = files
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io(format!("reading cache store {}", name), e))?
        {
            let path = file.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match self.read_entry(name, &path).await {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable cache entry: {}", e),
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> DiskStorage {
        DiskStorage::new(dir.path().join("caches"))
    }

    #[tokio::test]
    async fn keys_empty_when_root_missing() {
        let dir = TempDir::new().unwrap();
        assert!(storage(&dir).keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_put_lookup_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        assert!(!storage.open("pufferfishes-app-a1-v1").await.unwrap());
        assert!(storage.open("pufferfishes-app-a1-v1").await.unwrap());

        let resp = Response::new("https://p.test/apps/a1/app.js", 200, b"console.log(1)".to_vec())
            .with_header("content-type", "text/javascript");
        storage
            .put("pufferfishes-app-a1-v1", "GET https://p.test/apps/a1/app.js", resp.clone())
            .await
            .unwrap();

        let hit = storage
            .lookup("pufferfishes-app-a1-v1", "GET https://p.test/apps/a1/app.js")
            .await
            .unwrap();
        assert_eq!(hit, Some(resp));

        let miss = storage
            .lookup("pufferfishes-app-a1-v1", "GET https://p.test/apps/a1/other.js")
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn entries_lists_keys() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        for path in ["b", "a"] {
            let key = format!("GET https://p.test/{}", path);
            storage
                .put("s", &key, Response::new(key.clone(), 200, ""))
                .await
                .unwrap();
        }

        assert_eq!(
            storage.entries("s").await.unwrap(),
            vec!["GET https://p.test/a".to_string(), "GET https://p.test/b".to_string()]
        );
        assert_eq!(storage.keys().await.unwrap(), vec!["s".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_store() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        storage.put("s", "k", Response::new("u", 200, "x")).await.unwrap();
        assert!(storage.delete("s").await.unwrap());
        assert!(!storage.delete("s").await.unwrap());
        assert!(storage.lookup("s", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        assert!(storage.open("../escape").await.is_err());
        assert!(storage.open("a/b").await.is_err());
        assert!(storage.open("").await.is_err());
    }

    #[tokio::test]
    async fn corrupt_entry_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.open("s").await.unwrap();

        let path = storage.root().join("s").join(DiskStorage::entry_file_name("k"));
        std::fs::write(&path, "not json").unwrap();

        let err = storage.lookup("s", "k").await.unwrap_err();
        assert!(matches!(err, ShellcacheError::CorruptEntry { .. }));
    }
}
