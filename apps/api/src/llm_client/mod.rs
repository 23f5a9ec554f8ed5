//! The only place that talks to the Anthropic API. Everything else sees
//! [`TextGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Default model when `ANTHROPIC_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
/// Tried in order, after the configured model, only when a model is not found.
const FALLBACK_MODELS: &[&str] = &[
    "claude-sonnet-4-5-20250929",
    "claude-sonnet-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
];
const MAX_TOKENS: u32 = 2000;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No configured model is available")]
    NoModel,
}

impl LlmError {
    fn is_model_not_found(&self) -> bool {
        matches!(self, LlmError::Api { status: 404, .. })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl LlmResponse {
    /// First text block, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .find_map(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Outcome of a single HTTP round trip.
enum Attempt {
    Done(LlmResponse),
    Retry(LlmError),
    Fatal(LlmError),
}

/// Text returned by a generator together with the model that produced it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub model: String,
}

/// Anything that turns a prompt into text. Implemented by [`LlmClient`];
/// tests substitute canned generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<Generated, LlmError>;
}

/// Anthropic Messages API client with retry and model fallback.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    models: Vec<String>,
}

impl LlmClient {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, LlmError> {
        let mut models = vec![model.unwrap_or_else(|| DEFAULT_MODEL.to_string())];
        for candidate in FALLBACK_MODELS {
            if !models.iter().any(|m| m == candidate) {
                models.push(candidate.to_string());
            }
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            models,
        })
    }

    pub fn primary_model(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or(DEFAULT_MODEL)
    }

    /// One request against `model`, retried on transport errors, 429 and 5xx
    /// with 1s/2s backoff. Any other non-success status is returned at once.
    pub async fn call(&self, model: &str, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let body = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(1000 << (attempt - 1));
                warn!("Retrying {model} in {}ms (attempt {})", delay.as_millis(), attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&body).await {
                Attempt::Done(response) => {
                    debug!(
                        "{model}: {} input / {} output tokens",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retry(e) => {
                    warn!("{model} request failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    async fn attempt(&self, body: &MessagesRequest<'_>) -> Attempt {
        let sent = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await;
        let response = match sent {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(e.into()),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<LlmResponse>().await {
                Ok(parsed) => Attempt::Done(parsed),
                Err(e) => Attempt::Fatal(e.into()),
            };
        }

        let raw = response.text().await.unwrap_or_default();
        let error = LlmError::Api {
            status: status.as_u16(),
            message: serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw),
        };
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Attempt::Retry(error)
        } else {
            Attempt::Fatal(error)
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    /// Tries each model in turn, moving on only when the API reports the
    /// model as not found.
    async fn complete(&self, prompt: &str, system: &str) -> Result<Generated, LlmError> {
        let mut last_error = LlmError::NoModel;

        for model in &self.models {
            match self.call(model, prompt, system).await {
                Ok(response) => {
                    let text = response.text().ok_or(LlmError::EmptyContent)?;
                    info!(
                        "Generated {} output tokens with {model}",
                        response.usage.output_tokens
                    );
                    return Ok(Generated {
                        text: strip_json_fences(text).to_string(),
                        model: model.clone(),
                    });
                }
                Err(e) if e.is_model_not_found() => {
                    warn!("Model {model} not found, trying next candidate");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

/// Strips a surrounding ```json (or bare ```) fence from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let inner = inner.trim_start();
    inner.strip_suffix("```").map(str::trim).unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_configured_model_first_without_duplicates() {
        let client =
            LlmClient::new("key".into(), Some("claude-sonnet-4-20250514".into())).unwrap();
        assert_eq!(client.primary_model(), "claude-sonnet-4-20250514");
        assert_eq!(client.models.len(), FALLBACK_MODELS.len());

        let client = LlmClient::new("key".into(), None).unwrap();
        assert_eq!(client.primary_model(), DEFAULT_MODEL);
        assert_eq!(client.models.len(), FALLBACK_MODELS.len() + 1);
    }

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let response: LlmResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use"},{"type":"text","text":"hi"}],"usage":{"input_tokens":3,"output_tokens":1}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("hi"));
    }

    #[test]
    fn test_only_404_counts_as_model_not_found() {
        let not_found = LlmError::Api {
            status: 404,
            message: "model: nope".into(),
        };
        let unauthorized = LlmError::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert!(not_found.is_model_not_found());
        assert!(!unauthorized.is_model_not_found());
    }
}
