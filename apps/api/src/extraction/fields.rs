//! Per-field extractors. Each one is total: no match yields an empty value
//! with `matched == false`, never an error.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::sections::{blocks, section_lines, Section};
use super::Extracted;
use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry};

pub const MAX_EXPERIENCE: usize = 6;
pub const MAX_EDUCATION: usize = 3;
pub const MAX_PROJECTS: usize = 5;
pub const MAX_SKILLS: usize = 24;
pub const MAX_LIST_ITEMS: usize = 20;
pub const MAX_KNOWN_SKILLS: usize = 15;
const MAX_LIST_ITEM_CHARS: usize = 200;
const MAX_PROJECT_DESCRIPTION_CHARS: usize = 350;

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?\d{1,3}[\s-]?)?(\(?\d{2,4}\)?[\s-]?)?\d{3,4}[\s-]?\d{3,4}").unwrap()
});

static RE_LINKEDIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)linkedin\.com/in/[\w-]+").unwrap());

static RE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z'\-]*(\s+[A-Za-z][A-Za-z'\-]*)+$").unwrap());

static RE_PHONE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d[\d\s\-()]+$").unwrap());

static RE_NAME_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(RESUME|CV|CURRICULUM|EXPERIENCE|EDUCATION|SKILLS|SUMMARY|PROFILE|OBJECTIVE)\b",
    )
    .unwrap()
});

static RE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(street|road|avenue|city|state|zip|postal)\b").unwrap());

static RE_EDUCATION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(EDUCATION|UNIVERSITI|UNIVERSITY|CGPA|SPM|MATRICULATION)").unwrap()
});

static RE_DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(20\d{2}|19\d{2})\b.*?\b(20\d{2}|19\d{2}|Present|Current)\b").unwrap()
});

static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d{2}|19\d{2})\b").unwrap());

static RE_TECHNOLOGIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Technologies?|Built with|Using)[:\s]+([^\n]+)").unwrap());

static RE_SKILL_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(through|successful|various|responsible|experience|duties|tasks|resume|cv|owner)\b",
    )
    .unwrap()
});

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•·●▪◦‣⁃\-–—*]+\s*").unwrap());

static RE_SKILL_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,•·;|]").unwrap());

/// Technologies looked for in the full text when no skills heading exists.
const KNOWN_SKILLS: &[&str] = &[
    "Python", "JavaScript", "Java", "C++", "Ruby", "Go", "Swift", "React", "Angular", "Vue",
    "Node.js", "Django", "Flask", "SQL", "MongoDB", "PostgreSQL", "Redis", "AWS", "Azure", "GCP",
    "Docker", "Kubernetes", "Git", "CI/CD", "Agile", "Scrum",
];

static RE_KNOWN_SKILLS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    KNOWN_SKILLS
        .iter()
        .map(|skill| {
            let pattern = format!(
                r"(?i)(?:^|[^A-Za-z0-9]){}(?:$|[^A-Za-z0-9+#])",
                regex::escape(skill)
            );
            (*skill, Regex::new(&pattern).unwrap())
        })
        .collect()
});

fn found(value: String) -> Extracted<String> {
    Extracted {
        matched: !value.is_empty(),
        value,
    }
}

pub fn email(text: &str) -> Extracted<String> {
    found(
        RE_EMAIL
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    )
}

/// First loose phone-shaped run with a plausible digit count, which keeps
/// year ranges like `2019-2023` out.
pub fn phone(text: &str) -> Extracted<String> {
    found(
        RE_PHONE
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .find(|candidate| {
                let digits = candidate.chars().filter(char::is_ascii_digit).count();
                (9..=15).contains(&digits)
            })
            .map(str::to_string)
            .unwrap_or_default(),
    )
}

pub fn linkedin(text: &str) -> Extracted<String> {
    found(
        RE_LINKEDIN
            .find(text)
            .map(|m| format!("https://{}", m.as_str()))
            .unwrap_or_default(),
    )
}

pub fn name(lines: &[&str]) -> Extracted<String> {
    let candidate = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .take(10)
        .find(|line| {
            let len = line.chars().count();
            let lower = line.to_lowercase();
            (3..=60).contains(&len)
                && !line.contains('@')
                && !lower.contains("http")
                && !lower.contains("linkedin")
                && !RE_PHONE_LINE.is_match(line)
                && !RE_NAME_HEADING.is_match(line)
                && !RE_ADDRESS.is_match(line)
                && RE_NAME.is_match(line)
        });

    found(candidate.map(title_case_if_shouting).unwrap_or_default())
}

fn title_case_if_shouting(name: &str) -> String {
    if name.to_uppercase() != name {
        return name.to_string();
    }
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn summary(normalized: &str, lines: &[&str]) -> Extracted<String> {
    if let Some(section) = section_lines(lines, Section::Summary) {
        let text = section.join("\n").trim().to_string();
        if !text.is_empty() {
            return found(text);
        }
    }

    let paragraph = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(8)
        .find(|p| {
            let first_line = p.lines().next().unwrap_or_default();
            p.chars().count() >= 60
                && !p.contains('@')
                && !p.contains("http")
                && !RE_EDUCATION_WORDS.is_match(p)
                && Section::of_heading(first_line).is_none()
        });

    found(paragraph.map(str::to_string).unwrap_or_default())
}

pub fn experience(lines: &[&str]) -> Extracted<Vec<ExperienceEntry>> {
    let Some(section) = section_lines(lines, Section::Experience) else {
        return Extracted::missing();
    };

    let entries = blocks(&section)
        .into_iter()
        .filter(|block| block.len() >= 2 && block.join("\n").chars().count() >= 20)
        .map(|block| {
            let joined = block.join("\n");
            let mut head = block[0].splitn(3, '|').map(str::trim);
            let title = head.next().unwrap_or_default().to_string();
            let company = head
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| block[1].to_string());
            let dates = RE_DATE_RANGE
                .find(&joined)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            ExperienceEntry {
                title,
                company,
                dates,
                description: block[2..].join("\n"),
            }
        })
        .take(MAX_EXPERIENCE)
        .collect();

    Extracted::section(entries)
}

pub fn education(lines: &[&str]) -> Extracted<Vec<EducationEntry>> {
    let Some(section) = section_lines(lines, Section::Education) else {
        return Extracted::missing();
    };

    let entries = blocks(&section)
        .into_iter()
        .filter(|block| block.join("\n").chars().count() >= 10)
        .map(|block| {
            let joined = block.join("\n");
            let year = RE_YEAR
                .find(&joined)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            match block.get(1) {
                Some(second) => EducationEntry {
                    degree: block[0].to_string(),
                    school: second.to_string(),
                    year,
                },
                // A lone line is more often the school than the degree.
                None => EducationEntry {
                    degree: String::new(),
                    school: block[0].to_string(),
                    year,
                },
            }
        })
        .take(MAX_EDUCATION)
        .collect();

    Extracted::section(entries)
}

pub fn skills(lines: &[&str]) -> Extracted<Vec<String>> {
    let Some(section) = section_lines(lines, Section::Skills) else {
        return Extracted::missing();
    };

    let mut seen = HashSet::new();
    let skills = section
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        // "Languages: Java, Python" keeps only the list after the label.
        .map(|l| l.split_once(':').map_or(l, |(_, rest)| rest))
        .flat_map(|l| RE_SKILL_SPLIT.split(l))
        .map(|s| RE_BULLET.replace(s.trim(), "").split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| (2..=32).contains(&s.chars().count()))
        .filter(|s| !RE_SKILL_NOISE.is_match(s))
        .filter(|s| s.chars().any(|c| c.is_ascii_alphabetic()))
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(MAX_SKILLS)
        .collect();

    Extracted::section(skills)
}

/// Known technologies mentioned anywhere in `text`, in catalogue order.
pub fn known_skills(text: &str) -> Vec<String> {
    RE_KNOWN_SKILLS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .take(MAX_KNOWN_SKILLS)
        .collect()
}

pub fn projects(lines: &[&str]) -> Extracted<Vec<ProjectEntry>> {
    let Some(section) = section_lines(lines, Section::Projects) else {
        return Extracted::missing();
    };

    let entries = blocks(&section)
        .into_iter()
        .filter(|block| block.join("\n").chars().count() >= 20)
        .map(|block| {
            let joined = block.join("\n");
            let technologies = RE_TECHNOLOGIES
                .captures(&joined)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            ProjectEntry {
                name: RE_BULLET.replace(block[0], "").to_string(),
                description: truncate_chars(&block[1..].join(" "), MAX_PROJECT_DESCRIPTION_CHARS)
                    .trim()
                    .to_string(),
                technologies,
            }
        })
        .take(MAX_PROJECTS)
        .collect();

    Extracted::section(entries)
}

/// One item per line for the simple list sections.
pub fn list(lines: &[&str], section: Section) -> Extracted<Vec<String>> {
    let Some(section) = section_lines(lines, section) else {
        return Extracted::missing();
    };

    let items = section
        .iter()
        .map(|l| RE_BULLET.replace(l.trim(), "").trim().to_string())
        .filter(|l| !l.is_empty())
        .map(|l| truncate_chars(&l, MAX_LIST_ITEM_CHARS).to_string())
        .take(MAX_LIST_ITEMS)
        .collect();

    Extracted::section(items)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
