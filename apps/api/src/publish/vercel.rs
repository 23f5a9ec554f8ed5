use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Instant;
use tracing::{info, warn};

use super::{Hosted, HostedPublisher, PublishError};
use crate::models::order::DeployMode;

const VERCEL_API_URL: &str = "https://api.vercel.com/v13/deployments";
const CREATE_TIMEOUT: Duration = Duration::from_secs(45);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(1500);
const READY_DEADLINE: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct Deployment {
    id: Option<String>,
    url: Option<String>,
    #[serde(rename = "readyState")]
    ready_state: Option<String>,
    error: Option<DeploymentError>,
}

#[derive(Debug, Deserialize)]
struct DeploymentError {
    message: Option<String>,
}

#[derive(Serialize)]
struct DeploymentFile<'a> {
    file: &'static str,
    data: &'a str,
}

/// Creates a one-file production deployment and waits for it to be publicly reachable.
pub struct VercelPublisher {
    client: Client,
    token: String,
    api_url: String,
}

impl VercelPublisher {
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, VERCEL_API_URL)
    }

    pub fn with_api_url(token: String, api_url: &str) -> Self {
        Self {
            client: Client::new(),
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn create(&self, order_id: &str, html: &str) -> Result<Deployment, PublishError> {
        let project: String = order_id.chars().take(12).collect();
        let body = json!({
            "name": format!("resume-{project}"),
            "public": true,
            "files": [DeploymentFile { file: "index.html", data: html }],
            "projectSettings": { "framework": null },
            "target": "production",
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .timeout(CREATE_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch(&self, id: &str) -> Result<Deployment, PublishError> {
        let response = self
            .client
            .get(format!("{}/{id}", self.api_url))
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Deployment protection serves a login wall instead of the site.
    async fn probe(&self, url: &str) -> Result<(), PublishError> {
        let response = match self.client.get(url).timeout(REQUEST_TIMEOUT).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not probe {url}: {e}");
                return Ok(());
            }
        };
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if is_auth_gated(status, &body) {
            return Err(PublishError::AuthGated);
        }
        Ok(())
    }
}

/// Polls until `READY`, returning the final URL. Transient poll errors are
/// logged and retried until the deadline.
async fn wait_ready<F, Fut>(id: &str, mut url: String, mut fetch: F) -> Result<String, PublishError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Deployment, PublishError>>,
{
    let deadline = Instant::now() + READY_DEADLINE;
    let mut last_state: Option<String> = None;

    while Instant::now() < deadline {
        match fetch().await {
            Ok(deployment) => {
                if let Some(u) = deployment.url {
                    url = format!("https://{u}");
                }
                if let Some(state) = deployment.ready_state {
                    match state.as_str() {
                        "READY" => return Ok(url),
                        "ERROR" => {
                            let message = deployment
                                .error
                                .and_then(|e| e.message)
                                .unwrap_or_else(|| "Vercel deployment error".to_string());
                            return Err(PublishError::DeploymentFailed(message));
                        }
                        _ => last_state = Some(state),
                    }
                }
            }
            Err(e) => warn!("Polling deployment {id} failed: {e}"),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Err(PublishError::Timeout {
        last_state: last_state.unwrap_or_else(|| "unknown".to_string()),
    })
}

fn is_auth_gated(status: u16, body: &str) -> bool {
    status == 401
        || status == 403
        || body.contains("Authentication Required")
        || body.contains("requires Vercel authentication")
}

#[async_trait]
impl HostedPublisher for VercelPublisher {
    fn mode(&self) -> DeployMode {
        DeployMode::Vercel
    }

    async fn publish(&self, order_id: &str, html: &str) -> Result<Hosted, PublishError> {
        let created = self.create(order_id, html).await?;
        let (id, url) = match (created.id, created.url) {
            (Some(id), Some(url)) => (id, format!("https://{url}")),
            _ => {
                return Err(PublishError::InvalidResponse(
                    "Vercel returned an invalid response".to_string(),
                ))
            }
        };

        let url = wait_ready(&id, url, || self.fetch(&id)).await?;
        self.probe(&url).await?;

        info!("Deployed order {order_id} to {url}");
        Ok(Hosted {
            url,
            deployment_id: Some(id),
        })
    }
}
