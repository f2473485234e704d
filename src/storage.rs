//! Durable key/blob storage.
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A small key/blob store. Keys are slash-separated, container-style:
/// `whitelist/{id}`, `report/report.html`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a blob, overwriting any previous content.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Reads a blob. Missing keys are errors.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Keys directly under the given prefix, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// File-per-blob store under a root directory. Key segments map to path
/// segments, with directories created on demand.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(Error::Storage("empty key".to_string()));
        }
        if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(Error::Storage(format!("invalid key: {key}")));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(key = %key, bytes = bytes.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::Storage(format!("read {key}: {e}")))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_end_matches('/');
        let dir = self.blob_path(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                keys.push(format!("{prefix}/{}", entry.file_name().to_string_lossy()));
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let (_dir, store) = store();

        store.put("whitelist/U1", b"U1").await.unwrap();

        assert_eq!(store.get("whitelist/U1").await.unwrap(), b"U1");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_dir, store) = store();

        store.put("report/report.html", b"first").await.unwrap();
        store.put("report/report.html", b"second").await.unwrap();

        assert_eq!(store.get("report/report.html").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_get_missing_key_is_error() {
        let (_dir, store) = store();

        assert!(store.get("whitelist/NOPE").await.is_err());
    }

    #[tokio::test]
    async fn test_list_returns_sorted_keys_under_prefix() {
        let (_dir, store) = store();

        store.put("whitelist/U3", b"U3").await.unwrap();
        store.put("whitelist/U1", b"U1").await.unwrap();
        store.put("whitelist/U2", b"U2").await.unwrap();
        store.put("report/report.html", b"<html/>").await.unwrap();

        let keys = store.list("whitelist/").await.unwrap();
        assert_eq!(keys, vec!["whitelist/U1", "whitelist/U2", "whitelist/U3"]);
    }

    #[tokio::test]
    async fn test_list_of_unknown_prefix_is_empty() {
        let (_dir, store) = store();

        assert!(store.list("whitelist").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let (_dir, store) = store();

        assert!(store.put("../escape", b"x").await.is_err());
        assert!(store.get("whitelist/../../etc/passwd").await.is_err());
    }
}
