//! Turns a structured résumé into display copy.
//!
//! A configured generator is asked for a rewrite; anything that goes wrong
//! (no generator, blocked outbound path, call error, unusable response, or
//! invented figures) lands on the deterministic [`fallback`] instead. The
//! result is always usable.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::TextGenerator;
use crate::models::content::{EnhancedContent, EnhancementMeta, EnhancementMode};
use crate::models::resume::{ExperienceEntry, ProjectEntry, StructuredResume};

pub mod fallback;
pub mod guard;
pub mod prompts;

use fallback::{clamp_words, ABOUT_MAX_WORDS, HEADLINE_MAX_WORDS, HIGHLIGHT_MAX_WORDS, MAX_HIGHLIGHTS};

#[derive(Clone)]
pub struct Enhancer {
    generator: Option<Arc<dyn TextGenerator>>,
    outbound_blocked: bool,
}

impl Enhancer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, outbound_blocked: bool) -> Self {
        Self {
            generator,
            outbound_blocked,
        }
    }

    pub async fn enhance(&self, resume: &StructuredResume) -> EnhancedContent {
        let generator = match (&self.generator, self.outbound_blocked) {
            (Some(generator), false) => generator,
            (None, _) => {
                info!("No text generator configured; using fallback copy");
                return fallback::build(resume);
            }
            (Some(_), true) => {
                warn!("Outbound path is blocked; using fallback copy");
                return fallback::build(resume);
            }
        };

        let input = match serde_json::to_string_pretty(resume) {
            Ok(json) => json,
            Err(e) => return failed(resume, e.to_string(), false),
        };

        let generated = match generator
            .complete(&prompts::enhancement_prompt(&input), JSON_ONLY_SYSTEM)
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                warn!("Enhancement call failed: {e}");
                return failed(resume, e.to_string(), false);
            }
        };

        let mut candidate = match coerce(&generated.text) {
            Some(candidate) => candidate,
            None => {
                warn!("Enhancement response was not a JSON object");
                return failed(resume, "generator returned invalid JSON object".into(), false);
            }
        };
        clamp(&mut candidate);

        let output = serde_json::to_string(&candidate).unwrap_or_default();
        let invented = guard::new_metric_tokens(&input, &output);
        if !invented.is_empty() {
            warn!("Rejected generated copy with new figures: {invented:?}");
            return failed(
                resume,
                format!(
                    "generated output contained figures not present in the resume ({}); rejected",
                    invented.join(", ")
                ),
                true,
            );
        }

        candidate.meta = EnhancementMeta {
            mode: EnhancementMode::Claude,
            model: Some(generated.model),
            error: None,
            rejected: false,
        };
        info!("Content enhanced");
        candidate
    }
}

fn failed(resume: &StructuredResume, error: String, rejected: bool) -> EnhancedContent {
    let mut content = fallback::build(resume);
    content.meta.error = Some(error);
    content.meta.rejected = rejected;
    content
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn texts(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn objects<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

/// Reads a response into content, treating any missing or mistyped field as empty.
/// `None` only when the response is not a JSON object at all.
fn coerce(raw: &str) -> Option<EnhancedContent> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if !value.is_object() {
        return None;
    }

    Some(EnhancedContent {
        headline: text(&value, "headline"),
        highlights: texts(&value, "highlights"),
        about: text(&value, "about"),
        enhanced_experience: objects(&value, "enhancedExperience")
            .map(|e| ExperienceEntry {
                title: text(e, "title"),
                company: text(e, "company"),
                dates: text(e, "dates"),
                description: text(e, "description"),
            })
            .collect(),
        enhanced_projects: objects(&value, "enhancedProjects")
            .map(|p| ProjectEntry {
                name: text(p, "name"),
                description: text(p, "description"),
                technologies: text(p, "technologies"),
            })
            .collect(),
        enhanced_certifications: texts(&value, "enhancedCertifications"),
        enhanced_awards: texts(&value, "enhancedAwards"),
        enhanced_activities: texts(&value, "enhancedActivities"),
        enhanced_publications: texts(&value, "enhancedPublications"),
        meta: EnhancementMeta::default(),
    })
}

fn clamp(content: &mut EnhancedContent) {
    content.headline = clamp_words(&content.headline, HEADLINE_MAX_WORDS);
    content.about = clamp_words(&content.about, ABOUT_MAX_WORDS);
    content.highlights.truncate(MAX_HIGHLIGHTS);
    for highlight in &mut content.highlights {
        *highlight = clamp_words(highlight, HIGHLIGHT_MAX_WORDS);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::{Generated, LlmError};

    /// Returns a fixed response and remembers the prompt it was given.
    struct Canned {
        response: Result<String, u16>,
        prompt: Mutex<Option<String>>,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                prompt: Mutex::new(None),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                response: Err(status),
                prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<Generated, LlmError> {
            *self.prompt.lock().unwrap() = Some(prompt.to_string());
            match &self.response {
                Ok(text) => Ok(Generated {
                    text: text.clone(),
                    model: "test-model".into(),
                }),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "nope".into(),
                }),
            }
        }
    }

    fn resume(summary: &str) -> StructuredResume {
        StructuredResume {
            name: "Jane Doe".into(),
            summary: summary.into(),
            experience: vec![ExperienceEntry {
                title: "Engineer".into(),
                company: "Acme".into(),
                dates: "2020-2023".into(),
                description: "Led a small team".into(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_uses_fallback_without_error() {
        let got = Enhancer::new(None, false).enhance(&resume("Led a small team")).await;
        assert_eq!(got.meta.mode, EnhancementMode::Fallback);
        assert!(got.meta.error.is_none());
    }

    #[tokio::test]
    async fn test_blocked_outbound_skips_generator() {
        let generator = Canned::ok(r#"{"headline":"x"}"#);
        let got = Enhancer::new(Some(generator.clone()), true)
            .enhance(&resume("Led a small team"))
            .await;
        assert_eq!(got.meta.mode, EnhancementMode::Fallback);
        assert!(generator.prompt.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generated_copy_is_used_and_clamped() {
        let generator = Canned::ok(
            r#"{"headline":"one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen",
 "highlights":["a","b","c","d","e","f"],
 "about":"Backend engineer.",
 "enhancedExperience":[{"title":"Engineer","company":"Acme","dates":"2020-2023","description":"- Led a small team"}, "junk"],
 "enhancedAwards":"not a list"}"#,
        );
        let got = Enhancer::new(Some(generator.clone()), false)
            .enhance(&resume("Led a small team"))
            .await;

        assert_eq!(got.meta.mode, EnhancementMode::Claude);
        assert_eq!(got.meta.model.as_deref(), Some("test-model"));
        assert!(got.headline.ends_with("fourteen…"));
        assert_eq!(got.highlights.len(), 5);
        assert_eq!(got.enhanced_experience.len(), 1);
        assert!(got.enhanced_awards.is_empty());
        assert!(got.enhanced_projects.is_empty());

        let prompt = generator.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_invented_percentage_is_rejected() {
        let generator = Canned::ok(
            r#"{"headline":"Improved results by 40%","highlights":[],"about":"Team lead."}"#,
        );
        let got = Enhancer::new(Some(generator), false)
            .enhance(&resume("Led a small team"))
            .await;

        assert_eq!(got.meta.mode, EnhancementMode::Fallback);
        assert!(got.meta.rejected);
        assert!(got.meta.error.unwrap().contains("40%"));
        assert!(!got.headline.contains('%'));
    }

    #[tokio::test]
    async fn test_figures_from_the_resume_are_kept() {
        let generator = Canned::ok(r#"{"headline":"Cut latency 30%","about":"x"}"#);
        let got = Enhancer::new(Some(generator), false)
            .enhance(&resume("Cut latency 30% across services"))
            .await;
        assert_eq!(got.meta.mode, EnhancementMode::Claude);
        assert_eq!(got.headline, "Cut latency 30%");
    }

    #[tokio::test]
    async fn test_call_error_and_garbage_fall_back() {
        let got = Enhancer::new(Some(Canned::status(401)), false)
            .enhance(&resume("Led a small team"))
            .await;
        assert_eq!(got.meta.mode, EnhancementMode::Fallback);
        assert!(got.meta.error.is_some());
        assert!(!got.meta.rejected);

        let got = Enhancer::new(Some(Canned::ok("[1, 2, 3]")), false)
            .enhance(&resume("Led a small team"))
            .await;
        assert_eq!(got.meta.mode, EnhancementMode::Fallback);
        assert!(got.meta.error.is_some());
    }
}
