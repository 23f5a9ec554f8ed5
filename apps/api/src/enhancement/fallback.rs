use std::collections::HashSet;

use crate::models::content::{EnhancedContent, EnhancementMeta, EnhancementMode};
use crate::models::resume::{ExperienceEntry, ProjectEntry, StructuredResume};

pub const HEADLINE_MAX_WORDS: usize = 14;
pub const HIGHLIGHT_MAX_WORDS: usize = 18;
pub const ABOUT_MAX_WORDS: usize = 90;
pub const MAX_HIGHLIGHTS: usize = 5;
const FALLBACK_ABOUT_MAX_WORDS: usize = 120;

/// Keeps the first `max` words, marking the cut with an ellipsis.
pub fn clamp_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max {
        words.join(" ")
    } else {
        format!("{}…", words[..max].join(" "))
    }
}

fn non_empty(value: &str, placeholder: &str) -> String {
    match value.trim() {
        "" => placeholder.to_string(),
        v => v.to_string(),
    }
}

/// Deterministic display copy built only from the résumé itself.
pub fn build(resume: &StructuredResume) -> EnhancedContent {
    let mut seen = HashSet::new();
    let top_skills: Vec<&str> = resume
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .take(5)
        .collect();

    let role = resume
        .experience
        .first()
        .map(|e| e.title.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or("Professional");

    let headline = if top_skills.is_empty() {
        clamp_words(role, HEADLINE_MAX_WORDS)
    } else {
        let focus = top_skills.iter().take(3).copied().collect::<Vec<_>>().join(", ");
        clamp_words(&format!("{role} focused on {focus}"), HEADLINE_MAX_WORDS)
    };

    let about = match resume.summary.trim() {
        "" => format!(
            "Professional portfolio for {}.",
            non_empty(&resume.name, "the candidate")
        ),
        summary => clamp_words(summary, FALLBACK_ABOUT_MAX_WORDS),
    };

    let mut highlights: Vec<String> = resume
        .experience
        .iter()
        .take(3)
        .filter_map(|e| e.description.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|line| clamp_words(line, HIGHLIGHT_MAX_WORDS))
        .collect();
    if highlights.is_empty() && !top_skills.is_empty() {
        highlights.push(format!("Core skills: {}", top_skills.join(", ")));
    }
    highlights.truncate(MAX_HIGHLIGHTS);

    let enhanced_experience = resume
        .experience
        .iter()
        .map(|e| ExperienceEntry {
            title: non_empty(&e.title, "Role"),
            company: non_empty(&e.company, "Company"),
            dates: non_empty(&e.dates, "Date not specified"),
            description: non_empty(
                &e.description,
                "Responsibilities included various professional tasks.",
            ),
        })
        .collect();

    let enhanced_projects = resume
        .projects
        .iter()
        .map(|p| ProjectEntry {
            name: non_empty(&p.name, "Project"),
            description: non_empty(&p.description, "Project details available upon request."),
            technologies: p.technologies.trim().to_string(),
        })
        .collect();

    let keep = |items: &[String]| -> Vec<String> {
        items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    EnhancedContent {
        headline,
        highlights,
        about,
        enhanced_experience,
        enhanced_projects,
        enhanced_certifications: keep(&resume.certifications),
        enhanced_awards: keep(&resume.awards),
        enhanced_activities: keep(&resume.activities),
        enhanced_publications: keep(&resume.publications),
        meta: EnhancementMeta {
            mode: EnhancementMode::Fallback,
            ..Default::default()
        },
    }
}
