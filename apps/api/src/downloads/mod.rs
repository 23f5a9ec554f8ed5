//! Expiring, use-limited download tokens for order archives.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::info;

use crate::models::download::{DownloadLink, LinkState};
use crate::storage::StoreError;

pub mod file;
pub mod handlers;
pub mod postgres;

pub const DOWNLOAD_LIMIT: u32 = 10;
pub const LINK_VALIDITY_DAYS: i64 = 30;
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("Download link not found")]
    NotFound,

    #[error("Download link expired")]
    Expired,

    #[error("Download limit reached")]
    LimitReached,

    #[error("Archive file is missing")]
    FileMissing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a link in `state` cannot be redeemed, if it cannot.
pub(crate) fn rejection(state: LinkState) -> Option<RedeemError> {
    match state {
        LinkState::Usable => None,
        LinkState::Expired => Some(RedeemError::Expired),
        LinkState::Exhausted => Some(RedeemError::LimitReached),
    }
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn insert(&self, link: DownloadLink) -> Result<(), StoreError>;

    async fn get(&self, token: &str) -> Result<Option<DownloadLink>, StoreError>;

    /// Increments `downloads` by one if the link is usable at `now`; the
    /// check and the increment are a single atomic step.
    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<DownloadLink, RedeemError>;
}

/// 32 random bytes, lowercase hex.
pub fn generate_token() -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut bytes = [0_u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let mut encoded = String::with_capacity(TOKEN_BYTES * 2);
    for byte in bytes {
        encoded.push(HEX[(byte >> 4) as usize] as char);
        encoded.push(HEX[(byte & 0x0f) as usize] as char);
    }
    encoded
}

/// A redeemed link and the archive it points at.
#[derive(Debug)]
pub struct Retrieval {
    pub link: DownloadLink,
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Clone)]
pub struct Downloads {
    store: Arc<dyn LinkStore>,
    archive_dir: PathBuf,
    limit: u32,
}

impl Downloads {
    pub fn new(store: Arc<dyn LinkStore>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            archive_dir: archive_dir.into(),
            limit: DOWNLOAD_LIMIT,
        }
    }

    pub async fn issue(
        &self,
        email: &str,
        order_id: &str,
        zip_basename: Option<String>,
    ) -> Result<DownloadLink, StoreError> {
        let now = Utc::now();
        let link = DownloadLink {
            token: generate_token(),
            email: email.to_string(),
            order_id: order_id.to_string(),
            zip_basename,
            downloads: 0,
            created_at: now,
            expires_at: now + Duration::days(LINK_VALIDITY_DAYS),
        };
        self.store.insert(link.clone()).await?;
        info!("Issued download link for order {order_id}");
        Ok(link)
    }

    /// Validates the link, locates its archive, then consumes one download.
    /// A missing archive is reported before anything is consumed.
    pub async fn retrieve(&self, token: &str) -> Result<Retrieval, RedeemError> {
        let link = self.store.get(token).await?.ok_or(RedeemError::NotFound)?;
        if let Some(err) = rejection(link.state_at(Utc::now(), self.limit)) {
            return Err(err);
        }

        let path = self.locate(&link).await.ok_or(RedeemError::FileMissing)?;
        let link = self.store.redeem(token, Utc::now(), self.limit).await?;

        Ok(Retrieval {
            filename: link.archive_name(),
            link,
            path,
        })
    }

    async fn locate(&self, link: &DownloadLink) -> Option<PathBuf> {
        let primary = self.archive_dir.join(link.archive_name());
        let legacy = self.archive_dir.join(format!("{}.zip", link.order_id));
        for candidate in [primary, legacy] {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloads::file::FileLinkStore;

    async fn downloads(dir: &tempfile::TempDir) -> Downloads {
        let store = FileLinkStore::open(dir.path().join("download-links.json"))
            .await
            .unwrap();
        Downloads::new(Arc::new(store), dir.path().join("temp"))
    }

    fn write_archive(dir: &tempfile::TempDir, name: &str) {
        let temp = dir.path().join("temp");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::write(temp.join(name), b"PK").unwrap();
    }

    #[test]
    fn test_tokens_are_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_issue_sets_thirty_day_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let link = downloads(&dir)
            .await
            .issue("a@b.com", "o1", Some("Jane--o1.zip".into()))
            .await
            .unwrap();
        assert_eq!(link.expires_at - link.created_at, Duration::days(30));
        assert_eq!(link.downloads, 0);
    }

    #[tokio::test]
    async fn test_retrieval_consumes_exactly_one_download() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = downloads(&dir).await;
        write_archive(&dir, "Jane--o1.zip");
        let link = downloads
            .issue("a@b.com", "o1", Some("Jane--o1.zip".into()))
            .await
            .unwrap();

        let got = downloads.retrieve(&link.token).await.unwrap();
        assert_eq!(got.link.downloads, 1);
        assert_eq!(got.filename, "Jane--o1.zip");
        let got = downloads.retrieve(&link.token).await.unwrap();
        assert_eq!(got.link.downloads, 2);
    }

    #[tokio::test]
    async fn test_missing_file_does_not_consume() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = downloads(&dir).await;
        let link = downloads
            .issue("a@b.com", "o1", Some("gone.zip".into()))
            .await
            .unwrap();

        assert!(matches!(
            downloads.retrieve(&link.token).await,
            Err(RedeemError::FileMissing)
        ));
        let stored = downloads.store.get(&link.token).await.unwrap().unwrap();
        assert_eq!(stored.downloads, 0);
    }

    #[tokio::test]
    async fn test_legacy_order_zip_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = downloads(&dir).await;
        write_archive(&dir, "o1.zip");

        let friendly = downloads
            .issue("a@b.com", "o1", Some("Jane--o1.zip".into()))
            .await
            .unwrap();
        let got = downloads.retrieve(&friendly.token).await.unwrap();
        assert!(got.path.ends_with("o1.zip"));
        assert_eq!(got.filename, "Jane--o1.zip");

        let legacy = downloads.issue("a@b.com", "o1", None).await.unwrap();
        let got = downloads.retrieve(&legacy.token).await.unwrap();
        assert_eq!(got.filename, "o1.zip");
    }

    #[tokio::test]
    async fn test_limit_reached_after_ten_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = downloads(&dir).await;
        write_archive(&dir, "o1.zip");
        let link = downloads.issue("a@b.com", "o1", None).await.unwrap();

        for _ in 0..DOWNLOAD_LIMIT {
            downloads.retrieve(&link.token).await.unwrap();
        }
        assert!(matches!(
            downloads.retrieve(&link.token).await,
            Err(RedeemError::LimitReached)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            downloads(&dir).await.retrieve("nope").await,
            Err(RedeemError::NotFound)
        ));
    }
}
