use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A download token registered for one order's archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub token: String,
    pub email: String,
    pub order_id: String,
    /// Absent on links issued before archives carried a friendly name.
    #[serde(default)]
    pub zip_basename: Option<String>,
    #[serde(default)]
    pub downloads: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Usable,
    Expired,
    Exhausted,
}

impl DownloadLink {
    pub fn state_at(&self, now: DateTime<Utc>, limit: u32) -> LinkState {
        if now >= self.expires_at {
            LinkState::Expired
        } else if self.downloads >= limit {
            LinkState::Exhausted
        } else {
            LinkState::Usable
        }
    }

    /// File name of the archive on disk, falling back to the legacy `<order>.zip`.
    pub fn archive_name(&self) -> String {
        self.zip_basename
            .clone()
            .unwrap_or_else(|| format!("{}.zip", self.order_id))
    }
}
