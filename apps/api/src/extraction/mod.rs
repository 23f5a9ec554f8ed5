//! Résumé text structuring and the PDF parsers that feed it.
//!
//! `structure` is a total function over arbitrary text: every field is a
//! best-effort pattern match and absence yields an empty value. The parsers
//! behind [`ResumeParser`] only differ in where the text comes from.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::resume::StructuredResume;

pub mod confidence;
pub mod fields;
pub mod normalize;
pub mod pdf;
pub mod remote;
pub mod sections;
pub mod validation;

use normalize::{normalize_text, to_lines};
use sections::Section;

/// A single field extraction and whether its pattern or heading was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub matched: bool,
}

impl<T: Default> Extracted<T> {
    pub fn missing() -> Self {
        Self {
            value: T::default(),
            matched: false,
        }
    }

    /// A section whose heading was found, even if it held no usable entries.
    pub fn section(value: T) -> Self {
        Self {
            value,
            matched: true,
        }
    }
}

/// Structured résumé plus how much of it was actually recognised.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub resume: StructuredResume,
    pub confidence: f32,
    pub matched: Vec<&'static str>,
}

pub fn structure(raw: &str) -> Extraction {
    let text = normalize_text(raw);
    let lines = to_lines(&text);

    let name = fields::name(&lines);
    let email = fields::email(&text);
    let phone = fields::phone(&text);
    let linkedin = fields::linkedin(&text);
    let summary = fields::summary(&text, &lines);
    let experience = fields::experience(&lines);
    let education = fields::education(&lines);
    let skills = fields::skills(&lines);
    let projects = fields::projects(&lines);
    let certifications = fields::list(&lines, Section::Certifications);
    let awards = fields::list(&lines, Section::Awards);
    let activities = fields::list(&lines, Section::Activities);
    let publications = fields::list(&lines, Section::Publications);

    let matched = [
        ("name", name.matched),
        ("email", email.matched),
        ("phone", phone.matched),
        ("linkedin", linkedin.matched),
        ("summary", summary.matched),
        ("experience", experience.matched),
        ("education", education.matched),
        ("skills", skills.matched),
        ("projects", projects.matched),
        ("certifications", certifications.matched),
        ("awards", awards.matched),
        ("activities", activities.matched),
        ("publications", publications.matched),
    ]
    .into_iter()
    .filter_map(|(field, hit)| hit.then_some(field))
    .collect();

    let resume = StructuredResume {
        name: name.value,
        email: email.value,
        phone: phone.value,
        linkedin: linkedin.value,
        summary: summary.value,
        experience: experience.value,
        education: education.value,
        skills: skills.value,
        projects: projects.value,
        certifications: certifications.value,
        awards: awards.value,
        activities: activities.value,
        publications: publications.value,
    };

    Extraction {
        confidence: confidence::score(&resume),
        resume,
        matched,
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parser unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote parser failed: {0}")]
    Remote(String),

    #[error("PDF could not be read: {0}")]
    Pdf(String),

    #[error("PDF contains no extractable text")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where an uploaded résumé lives: on local disk and at its public URL.
#[derive(Debug, Clone)]
pub struct ResumeSource {
    pub path: PathBuf,
    pub public_url: String,
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, source: &ResumeSource) -> Result<Extraction, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "JANE DOE\n\
        jane@x.com | +60 12-345 6789 | linkedin.com/in/janedoe\n\
        \n\
        SUMMARY\n\
        Backend engineer focused on payments.\n\
        \n\
        EXPERIENCE\n\
        Engineer | Acme\n\
        2020 - 2023\n\
        Built the order pipeline\n\
        \n\
        EDUCATION\n\
        BSc Computer Science\n\
        University of Malaya 2019\n\
        \n\
        SKILLS\n\
        Rust, PostgreSQL, Docker\n\
        \n\
        AWARDS\n\
        - Dean's list\n";

    #[test]
    fn test_structure_full_resume() {
        let got = structure(SAMPLE);
        let r = &got.resume;
        assert_eq!(r.name, "Jane Doe");
        assert_eq!(r.email, "jane@x.com");
        assert_eq!(r.phone, "+60 12-345 6789");
        assert_eq!(r.linkedin, "https://linkedin.com/in/janedoe");
        assert_eq!(r.summary, "Backend engineer focused on payments.");
        assert_eq!(r.experience[0].title, "Engineer");
        assert_eq!(r.experience[0].company, "Acme");
        assert_eq!(r.experience[0].dates, "2020 - 2023");
        assert_eq!(r.education[0].year, "2019");
        assert_eq!(r.skills, vec!["Rust", "PostgreSQL", "Docker"]);
        assert_eq!(r.awards, vec!["Dean's list"]);
        assert!((got.confidence - 1.0).abs() < f32::EPSILON);
        assert!(got.matched.contains(&"awards"));
        assert!(!got.matched.contains(&"projects"));
    }

    #[test]
    fn test_structure_is_total_over_garbage() {
        for input in ["", "   \n\n\t", "\u{0}\u{1}\u{FFFD}%PDF-1.4 \u{E000}\u{E001}", "@@@@\n----\n"] {
            let got = structure(input);
            assert!(got.resume.experience.is_empty());
            assert!(got.resume.skills.is_empty());
            assert!(got.confidence <= 0.2);
        }
    }
}
