use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{rejection, LinkStore, RedeemError};
use crate::models::download::DownloadLink;
use crate::storage::{JsonFile, StoreError};

/// Links persisted as a JSON array in `download-links.json`.
pub struct FileLinkStore {
    file: JsonFile<Vec<DownloadLink>>,
}

impl FileLinkStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path).await?,
        })
    }
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn insert(&self, link: DownloadLink) -> Result<(), StoreError> {
        self.file
            .update(|links| {
                links.push(link);
                Ok(())
            })
            .await
    }

    async fn get(&self, token: &str) -> Result<Option<DownloadLink>, StoreError> {
        Ok(self
            .file
            .read()
            .await
            .iter()
            .find(|l| l.token == token)
            .cloned())
    }

    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<DownloadLink, RedeemError> {
        self.file
            .update(|links| {
                let link = links
                    .iter_mut()
                    .find(|l| l.token == token)
                    .ok_or(RedeemError::NotFound)?;
                if let Some(err) = rejection(link.state_at(now, limit)) {
                    return Err(err);
                }
                link.downloads += 1;
                Ok(link.clone())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn link(token: &str, downloads: u32, expires_in: Duration) -> DownloadLink {
        let now = Utc::now();
        DownloadLink {
            token: token.into(),
            email: "a@b.com".into(),
            order_id: "o1".into(),
            zip_basename: None,
            downloads,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_redeem_rejects_expired_and_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLinkStore::open(dir.path().join("links.json")).await.unwrap();
        store.insert(link("old", 0, Duration::seconds(-5))).await.unwrap();
        store.insert(link("used", 10, Duration::days(1))).await.unwrap();

        assert!(matches!(
            store.redeem("old", Utc::now(), 10).await,
            Err(RedeemError::Expired)
        ));
        assert!(matches!(
            store.redeem("used", Utc::now(), 10).await,
            Err(RedeemError::LimitReached)
        ));
        assert_eq!(store.get("used").await.unwrap().unwrap().downloads, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeems_respect_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(
            FileLinkStore::open(dir.path().join("links.json")).await.unwrap(),
        );
        store.insert(link("t", 7, Duration::days(1))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.redeem("t", Utc::now(), 10).await }));
        }
        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(store.get("t").await.unwrap().unwrap().downloads, 10);
    }
}
