use serde::{Deserialize, Serialize};

use crate::models::resume::{ExperienceEntry, ProjectEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementMode {
    Claude,
    #[default]
    Fallback,
}

/// How the display copy was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancementMeta {
    pub mode: EnhancementMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when a generated candidate was discarded for introducing new figures.
    #[serde(default)]
    pub rejected: bool,
}

/// Polished display copy rendered into the portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancedContent {
    pub headline: String,
    pub highlights: Vec<String>,
    pub about: String,
    pub enhanced_experience: Vec<ExperienceEntry>,
    pub enhanced_projects: Vec<ProjectEntry>,
    pub enhanced_certifications: Vec<String>,
    pub enhanced_awards: Vec<String>,
    pub enhanced_activities: Vec<String>,
    pub enhanced_publications: Vec<String>,
    pub meta: EnhancementMeta,
}
