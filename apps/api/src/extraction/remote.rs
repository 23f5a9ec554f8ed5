use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{confidence, Extraction, ParseError, ResumeParser, ResumeSource};
use crate::models::resume::StructuredResume;

const APIFY_API_URL: &str = "https://api.apify.com/v2";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// One dataset item pushed by the résumé-parsing actor.
#[derive(Debug, Deserialize)]
struct ActorItem {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    data: Option<StructuredResume>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs a hosted actor that downloads the PDF from its public URL and
/// returns the structured résumé.
#[derive(Clone)]
pub struct ApifyParser {
    client: Client,
    token: String,
    actor_id: String,
    outbound_blocked: bool,
}

impl ApifyParser {
    pub fn new(token: String, actor_id: String, outbound_blocked: bool) -> Result<Self, ParseError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            token,
            actor_id,
            outbound_blocked,
        })
    }

    fn run_url(&self) -> String {
        // The API addresses `user/actor` ids as `user~actor`.
        format!(
            "{APIFY_API_URL}/acts/{}/run-sync-get-dataset-items",
            self.actor_id.replace('/', "~")
        )
    }
}

/// URLs the hosted actor cannot fetch.
pub fn is_local_url(url: &str) -> bool {
    url.contains("://localhost") || url.contains("://127.0.0.1") || url.contains("://0.0.0.0")
}

#[async_trait]
impl ResumeParser for ApifyParser {
    async fn parse(&self, source: &ResumeSource) -> Result<Extraction, ParseError> {
        if self.outbound_blocked {
            return Err(ParseError::Unavailable(
                "outbound HTTP proxy is misconfigured".into(),
            ));
        }
        if is_local_url(&source.public_url) {
            return Err(ParseError::Unavailable(format!(
                "{} is not publicly reachable",
                source.public_url
            )));
        }

        info!("Calling remote parser for {}", source.public_url);
        let response = self
            .client
            .post(self.run_url())
            .query(&[("token", self.token.as_str())])
            .json(&serde_json::json!({ "pdfUrl": source.public_url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Remote parser returned {status}: {body}");
            return Err(ParseError::Remote(format!("status {status}")));
        }

        let items: Vec<ActorItem> = response.json().await?;
        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| ParseError::Remote("no dataset items returned".into()))?;

        if !item.success {
            return Err(ParseError::Remote(
                item.error.unwrap_or_else(|| "extraction failed".into()),
            ));
        }
        let resume = item
            .data
            .ok_or_else(|| ParseError::Remote("item has no data".into()))?;

        let score = confidence::score(&resume);
        info!(
            "Remote extraction complete: confidence {:.2}",
            item.confidence.unwrap_or(score)
        );

        Ok(Extraction {
            confidence: item.confidence.unwrap_or(score),
            matched: matched_fields(&resume),
            resume,
        })
    }
}

fn matched_fields(resume: &StructuredResume) -> Vec<&'static str> {
    [
        ("name", !resume.name.is_empty()),
        ("email", !resume.email.is_empty()),
        ("phone", !resume.phone.is_empty()),
        ("linkedin", !resume.linkedin.is_empty()),
        ("summary", !resume.summary.is_empty()),
        ("experience", !resume.experience.is_empty()),
        ("education", !resume.education.is_empty()),
        ("skills", !resume.skills.is_empty()),
        ("projects", !resume.projects.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, hit)| hit.then_some(field))
    .collect()
}
