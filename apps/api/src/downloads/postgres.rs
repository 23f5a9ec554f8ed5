use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{rejection, LinkStore, RedeemError};
use crate::models::download::DownloadLink;
use crate::storage::StoreError;

pub struct PgLinkStore {
    db: PgPool,
}

impl PgLinkStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    token: String,
    email: String,
    order_id: String,
    zip_basename: Option<String>,
    downloads: i32,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<LinkRow> for DownloadLink {
    fn from(row: LinkRow) -> Self {
        DownloadLink {
            token: row.token,
            email: row.email,
            order_id: row.order_id,
            zip_basename: row.zip_basename,
            downloads: row.downloads.max(0) as u32,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

const LINK_COLUMNS: &str = "token, email, order_id, zip_basename, downloads, created_at, expires_at";

#[async_trait]
impl LinkStore for PgLinkStore {
    async fn insert(&self, link: DownloadLink) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO download_links \
             (token, email, order_id, zip_basename, downloads, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&link.token)
        .bind(&link.email)
        .bind(&link.order_id)
        .bind(&link.zip_basename)
        .bind(i32::try_from(link.downloads).unwrap_or(i32::MAX))
        .bind(link.created_at)
        .bind(link.expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<DownloadLink>, StoreError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM download_links WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(DownloadLink::from))
    }

    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<DownloadLink, RedeemError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "UPDATE download_links SET downloads = downloads + 1 \
             WHERE token = $1 AND expires_at > $2 AND downloads < $3 \
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(token)
        .bind(now)
        .bind(i32::try_from(limit).unwrap_or(i32::MAX))
        .fetch_optional(&self.db)
        .await
        .map_err(StoreError::from)?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Nothing updated: report why.
        let link = self.get(token).await?.ok_or(RedeemError::NotFound)?;
        Err(rejection(link.state_at(now, limit)).unwrap_or(RedeemError::NotFound))
    }
}
