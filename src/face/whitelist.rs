//! Durable whitelist of users excused from face detection.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::profile::report::ValidationReport;
use crate::slack::User;
use crate::storage::BlobStore;

const WHITELIST_PREFIX: &str = "whitelist";
const REPORT_KEY: &str = "report/report.html";

/// Users excused from the image check, plus the report slot that rides on
/// the same storage.
#[async_trait]
pub trait FaceWhitelist: Send + Sync {
    /// Membership check. The first call after startup loads the whole
    /// whitelist from storage.
    async fn is_whitelisted(&self, user: &User) -> Result<bool>;

    /// Adds a user. No-op when already whitelisted. There is no removal.
    async fn whitelist_user(&self, user: &User) -> Result<()>;

    /// Current membership as references carrying only ids, sorted.
    async fn whitelisted_users(&self) -> Result<Vec<User>>;

    /// Persists the report HTML to the single report slot, overwriting.
    async fn upload_report(&self, report: &ValidationReport) -> Result<()>;
}

/// Blob-backed whitelist: one blob per id under `whitelist/`, mirrored in an
/// in-memory set that is populated lazily on first query.
pub struct StoredWhitelist {
    store: Arc<dyn BlobStore>,
    members: RwLock<Option<HashSet<String>>>,
}

impl StoredWhitelist {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            members: RwLock::new(None),
        }
    }

    async fn ensure_loaded(&self) -> Result<()> {
        if self.members.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.members.write().await;
        if guard.is_some() {
            // Another task loaded while we waited for the write lock.
            return Ok(());
        }

        let mut members = HashSet::new();
        for key in self.store.list(WHITELIST_PREFIX).await? {
            let bytes = self.store.get(&key).await?;
            let id = String::from_utf8_lossy(&bytes).trim().to_string();
            if !id.is_empty() {
                members.insert(id);
            }
        }

        tracing::info!(count = members.len(), "Loaded whitelist from storage");
        *guard = Some(members);
        Ok(())
    }
}

#[async_trait]
impl FaceWhitelist for StoredWhitelist {
    async fn is_whitelisted(&self, user: &User) -> Result<bool> {
        user.guard()?;
        self.ensure_loaded().await?;

        let guard = self.members.read().await;
        Ok(guard
            .as_ref()
            .map(|members| members.contains(&user.id))
            .unwrap_or(false))
    }

    async fn whitelist_user(&self, user: &User) -> Result<()> {
        user.guard()?;

        if self.is_whitelisted(user).await? {
            return Ok(());
        }

        // Persist before updating the set, so a crash in between leaves
        // storage as the source of truth for the next cold load.
        let key = format!("{WHITELIST_PREFIX}/{}", user.id);
        self.store.put(&key, user.id.as_bytes()).await?;

        if let Some(members) = self.members.write().await.as_mut() {
            members.insert(user.id.clone());
        }

        tracing::info!(user = %user.id, "Whitelisted user");
        Ok(())
    }

    async fn whitelisted_users(&self) -> Result<Vec<User>> {
        self.ensure_loaded().await?;

        let guard = self.members.read().await;
        let mut ids: Vec<String> = guard
            .as_ref()
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();

        Ok(ids.into_iter().map(User::with_id).collect())
    }

    async fn upload_report(&self, report: &ValidationReport) -> Result<()> {
        self.store
            .put(REPORT_KEY, report.to_html().as_bytes())
            .await?;
        tracing::info!("Uploaded validation report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ValidationResult;
    use crate::storage::FsBlobStore;

    fn stored_whitelist(dir: &tempfile::TempDir) -> StoredWhitelist {
        StoredWhitelist::new(Arc::new(FsBlobStore::new(dir.path())))
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_whitelisted() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        assert!(!whitelist.is_whitelisted(&User::with_id("U1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_then_query_hits() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        whitelist.whitelist_user(&User::with_id("U1")).await.unwrap();

        assert!(whitelist.is_whitelisted(&User::with_id("U1")).await.unwrap());
        assert!(!whitelist.is_whitelisted(&User::with_id("U2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_membership_survives_cold_reload() {
        let dir = tempfile::tempdir().unwrap();

        let first = stored_whitelist(&dir);
        first.whitelist_user(&User::with_id("U1TBU8337")).await.unwrap();
        drop(first);

        let second = stored_whitelist(&dir);
        assert!(second
            .is_whitelisted(&User::with_id("U1TBU8337"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_persist_happens_before_cache_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsBlobStore::new(dir.path()));
        let whitelist = StoredWhitelist::new(store.clone());

        whitelist.whitelist_user(&User::with_id("U1")).await.unwrap();

        assert_eq!(store.get("whitelist/U1").await.unwrap(), b"U1");
    }

    #[tokio::test]
    async fn test_re_adding_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        whitelist.whitelist_user(&User::with_id("U1")).await.unwrap();
        whitelist.whitelist_user(&User::with_id("U1")).await.unwrap();

        let users = whitelist.whitelisted_users().await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_id_only() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        for id in ["U3", "U1", "U2"] {
            whitelist.whitelist_user(&User::with_id(id)).await.unwrap();
        }

        let users = whitelist.whitelisted_users().await.unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2", "U3"]);
        assert!(users.iter().all(|u| u.name.is_empty()));
    }

    #[tokio::test]
    async fn test_whitelisting_without_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        assert!(whitelist.whitelist_user(&User::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_membership_check_without_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let whitelist = stored_whitelist(&dir);

        assert!(whitelist.is_whitelisted(&User::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_report_overwrites_single_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsBlobStore::new(dir.path()));
        let whitelist = StoredWhitelist::new(store.clone());

        let first = ValidationReport::new(vec![ValidationResult::invalid(
            User::with_id("U1"),
            "First name is missing".to_string(),
            Some("https://img.example.com/u1.jpg".to_string()),
        )]);
        whitelist.upload_report(&first).await.unwrap();

        let second = ValidationReport::new(vec![ValidationResult::invalid(
            User::with_id("U2"),
            "Last name is missing".to_string(),
            Some("https://img.example.com/u2.jpg".to_string()),
        )]);
        whitelist.upload_report(&second).await.unwrap();

        let html =
            String::from_utf8(store.get("report/report.html").await.unwrap()).unwrap();
        assert!(html.contains("<td>U2</td>"));
        assert!(html.contains("https://img.example.com/u2.jpg"));
        assert!(!html.contains("https://img.example.com/u1.jpg"));
    }
}
