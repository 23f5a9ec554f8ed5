use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use super::{Hosted, HostedPublisher, PublishError};
use crate::models::order::DeployMode;

/// Publishes `sites/<order>/index.html` to an S3-compatible bucket.
pub struct S3Publisher {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl S3Publisher {
    /// `public_url` is the base the bucket's objects are reachable under.
    pub fn new(client: S3Client, bucket: String, public_url: &str) -> Self {
        Self {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn key(order_id: &str) -> String {
        format!("sites/{order_id}/index.html")
    }
}

#[async_trait]
impl HostedPublisher for S3Publisher {
    fn mode(&self) -> DeployMode {
        DeployMode::S3
    }

    async fn publish(&self, order_id: &str, html: &str) -> Result<Hosted, PublishError> {
        let key = Self::key(order_id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(html.as_bytes().to_vec()))
            .content_type("text/html; charset=utf-8")
            .send()
            .await
            .map_err(|e| PublishError::Storage(e.to_string()))?;

        info!("Uploaded site to s3://{}/{}", self.bucket, key);
        Ok(Hosted {
            url: format!("{}/{key}", self.public_url),
            deployment_id: None,
        })
    }
}
