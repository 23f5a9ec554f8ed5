use serde::Serialize;

use super::fields;
use super::normalize::{normalize_text, to_lines};

pub const MIN_WORDS: usize = 50;

const EDUCATION_KEYWORDS: &[&str] = &[
    "education", "university", "college", "degree", "bachelor", "master", "phd", "school",
    "academic", "graduation", "gpa", "major", "minor",
];

const EXPERIENCE_KEYWORDS: &[&str] = &[
    "experience", "work", "employment", "job", "position", "role", "company", "employer",
    "responsibilities", "achievements", "internship", "intern", "volunteer", "freelance",
];

const SKILLS_KEYWORDS: &[&str] = &[
    "skills", "technologies", "competencies", "abilities", "programming", "languages", "tools",
    "software", "frameworks", "certifications", "courses",
];

/// Outcome of checking that extracted text plausibly came from a résumé.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeValidation {
    pub is_valid: bool,
    pub word_count: usize,
    pub education: bool,
    pub experience: bool,
    pub skills: bool,
    pub detected_skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn validate_text(raw: &str) -> ResumeValidation {
    let text = normalize_text(raw);
    let lower = text.to_lowercase();
    let word_count = lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .count();

    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    let education = has_any(EDUCATION_KEYWORDS);
    let experience = has_any(EXPERIENCE_KEYWORDS);
    let skills = has_any(SKILLS_KEYWORDS);

    let lines = to_lines(&text);
    let section_skills = fields::skills(&lines);
    let detected_skills = if section_skills.matched && !section_skills.value.is_empty() {
        section_skills.value
    } else {
        fields::known_skills(&text)
    };

    let error = if word_count < MIN_WORDS {
        Some(format!(
            "Resume too short (minimum {MIN_WORDS} words required)"
        ))
    } else if !(education || experience) {
        Some(
            "Resume missing key sections (Education or Experience). Please upload a standard resume."
                .to_string(),
        )
    } else {
        None
    };

    ResumeValidation {
        is_valid: error.is_none(),
        word_count,
        education,
        experience,
        skills,
        detected_skills,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(words: usize) -> String {
        (0..words).map(|_| "lorem").collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_rejected() {
        let got = validate_text("Jane Doe experience education");
        assert!(!got.is_valid);
        assert!(got.error.unwrap().contains("too short"));
    }

    #[test]
    fn test_needs_education_or_experience() {
        let got = validate_text(&filler(60));
        assert!(!got.is_valid);
        assert!(got.error.unwrap().contains("missing key sections"));

        let got = validate_text(&format!("{} university", filler(60)));
        assert!(got.is_valid);
        assert!(got.education);
        assert!(!got.experience);
    }

    #[test]
    fn test_skills_fall_back_to_known_list() {
        let text = format!("{} experience with Python and Docker", filler(60));
        let got = validate_text(&text);
        assert_eq!(got.detected_skills, vec!["Python", "Docker"]);

        let text = format!("{}\nSKILLS\nRust, Tokio\n", filler(60));
        assert_eq!(validate_text(&text).detected_skills, vec!["Rust", "Tokio"]);
    }
}
