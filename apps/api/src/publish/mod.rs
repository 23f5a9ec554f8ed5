//! Site publishing.
//!
//! A hosted provider (Vercel or S3) is tried first. Any hosted failure, or
//! no hosted provider at all, degrades to writing the page under the local
//! generated directory. Only a failed local write is reported as an error.

pub mod local;
pub mod s3;
pub mod vercel;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::order::DeployMode;

pub use local::LocalPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hosting API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    InvalidResponse(String),

    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("Deployment timeout (lastState={last_state})")]
    Timeout { last_state: String },

    #[error("Deployment requires authentication (deployment protection is enabled)")]
    AuthGated,

    #[error("Object storage upload failed: {0}")]
    Storage(String),

    #[error("Failed to write site: {0}")]
    Io(#[from] std::io::Error),
}

/// A successful hosted deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Hosted {
    pub url: String,
    pub deployment_id: Option<String>,
}

#[async_trait]
pub trait HostedPublisher: Send + Sync {
    fn mode(&self) -> DeployMode;
    async fn publish(&self, order_id: &str, html: &str) -> Result<Hosted, PublishError>;
}

/// Where the site ended up. `error` and `admin_message` are set whenever the
/// hosted path was skipped or failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub url: String,
    pub mode: DeployMode,
    pub deployment_id: Option<String>,
    pub error: Option<String>,
    pub admin_message: Option<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, order_id: &str, html: &str) -> Result<PublishOutcome, PublishError>;
}

pub struct SitePublisher {
    hosted: Option<Arc<dyn HostedPublisher>>,
    local: LocalPublisher,
    outbound_blocked: bool,
    admin_contact: String,
}

impl SitePublisher {
    pub fn new(
        hosted: Option<Arc<dyn HostedPublisher>>,
        local: LocalPublisher,
        outbound_blocked: bool,
        admin_contact: impl Into<String>,
    ) -> Self {
        Self {
            hosted,
            local,
            outbound_blocked,
            admin_contact: admin_contact.into(),
        }
    }

    async fn degrade(&self, order_id: &str, html: &str, reason: String) -> Result<PublishOutcome, PublishError> {
        warn!("Publishing order {order_id} locally: {reason}");
        let url = self.local.publish(order_id, html).await?;
        Ok(PublishOutcome {
            url,
            mode: DeployMode::Local,
            deployment_id: None,
            error: Some(reason),
            admin_message: Some(format!(
                "Deployment issue. You may contact admin: {}",
                self.admin_contact
            )),
        })
    }
}

#[async_trait]
impl Publisher for SitePublisher {
    async fn publish(&self, order_id: &str, html: &str) -> Result<PublishOutcome, PublishError> {
        let Some(hosted) = &self.hosted else {
            return self
                .degrade(order_id, html, "No hosting provider is configured".to_string())
                .await;
        };
        if self.outbound_blocked {
            return self
                .degrade(order_id, html, "Outbound HTTP proxy is misconfigured".to_string())
                .await;
        }

        match hosted.publish(order_id, html).await {
            Ok(Hosted { url, deployment_id }) => {
                info!("Order {order_id} published via {:?}", hosted.mode());
                Ok(PublishOutcome {
                    url,
                    mode: hosted.mode(),
                    deployment_id,
                    error: None,
                    admin_message: None,
                })
            }
            Err(e) => self.degrade(order_id, html, e.to_string()).await,
        }
    }
}
