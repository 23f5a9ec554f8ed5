use std::path::PathBuf;

use tracing::info;

use super::PublishError;

/// Writes the site under the generated directory served at `/generated`.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    dir: PathBuf,
    base_url: String,
}

impl LocalPublisher {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn publish(&self, order_id: &str, html: &str) -> Result<String, PublishError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{order_id}.html"));
        tokio::fs::write(&path, html).await?;

        let url = format!("{}/generated/{order_id}.html", self.base_url);
        info!("Site for order {order_id} written to {}", path.display());
        Ok(url)
    }
}
