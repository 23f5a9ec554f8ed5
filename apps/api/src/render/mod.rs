//! Portfolio site rendering.
//!
//! [`PortfolioRenderer`] turns a structured résumé plus its enhanced copy into
//! one self-contained HTML document. Each content section is emitted only when
//! it has data, and the navigation bar lists exactly the emitted sections.
//! Every user-sourced string goes through [`escape::escape`].

pub mod escape;
mod fallback;
pub mod skills;
mod template;

use std::fmt::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::enhancement::fallback::clamp_words;
use crate::models::content::EnhancedContent;
use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry, StructuredResume};

use escape::{escape, strip_bullet};
pub use fallback::minimal_document;

const ABOUT_PARAGRAPHS: usize = 2;
const ABOUT_PARAGRAPH_WORDS: usize = 120;
const MAX_BULLETS: usize = 6;
const MAX_LIST_ITEMS: usize = 12;
const META_DESCRIPTION_CHARS: usize = 150;

const PLACEHOLDER_NAMES: &[&str] = &["resume owner", "your name", "name", "full name", "candidate"];

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());
static RE_SENIORITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(senior|junior|lead|principal|staff)\s+").unwrap());
static RE_GARBAGE_ROLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(through|successful|various|resume|owner)\b").unwrap());

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write document: {0}")]
    Format(#[from] fmt::Error),
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Public URL of the customer's photo, shown in place of the initials avatar.
    pub photo_url: Option<String>,
}

pub trait SiteRenderer: Send + Sync {
    fn render(
        &self,
        resume: &StructuredResume,
        content: &EnhancedContent,
        options: &RenderOptions,
    ) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioRenderer;

impl SiteRenderer for PortfolioRenderer {
    fn render(
        &self,
        resume: &StructuredResume,
        content: &EnhancedContent,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        render_portfolio(resume, content, options)
    }
}

/// The degraded document the pipeline publishes when rendering fails.
pub fn fallback_document(resume: &StructuredResume, content: &EnhancedContent) -> String {
    let headline = non_empty(&content.headline).unwrap_or_else(|| derive_headline(resume));
    let about = non_empty(&content.about).unwrap_or_else(|| resume.summary.trim().to_string());
    minimal_document(&display_name(resume), &headline, &about)
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// The résumé name, or one derived from the email local part when the name is
/// missing or an obvious template placeholder.
pub fn display_name(resume: &StructuredResume) -> String {
    let name = resume.name.trim();
    if !name.is_empty() && !PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str()) {
        return name.to_string();
    }
    let local = resume.email.split('@').next().unwrap_or_default();
    local
        .split(['.', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let first_char = |w: &str| w.chars().next().map(|c| c.to_uppercase().to_string());
    match words.as_slice() {
        [] => "P".to_string(),
        [only] => first_char(only).unwrap_or_else(|| "P".to_string()),
        [first, .., last] => format!(
            "{}{}",
            first_char(first).unwrap_or_default(),
            first_char(last).unwrap_or_default()
        ),
    }
}

fn derive_role(resume: &StructuredResume) -> String {
    if let Some(title) = resume.experience.first().map(|e| e.title.trim()) {
        let stripped = RE_SENIORITY.replace(title, "");
        let role = stripped.split([',', '|']).next().unwrap_or_default().trim();
        if role.chars().count() >= 3 && !RE_GARBAGE_ROLE.is_match(role) {
            return role.to_string();
        }
    }
    match resume.skills.iter().take(2).find(|s| s.chars().count() > 2) {
        Some(skill) => format!("{} Developer", skill.trim()),
        None => "Professional".to_string(),
    }
}

/// Hero headline used when the enhanced copy carries none.
pub fn derive_headline(resume: &StructuredResume) -> String {
    let title = resume
        .experience
        .first()
        .map(|e| e.title.trim())
        .filter(|t| !t.is_empty());
    let skills: Vec<&str> = resume
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(4)
        .collect();

    match (title, skills.is_empty()) {
        (Some(title), false) => format!(
            "Experienced {title} with expertise in {}. Passionate about delivering quality work and continuous improvement.",
            skills[..skills.len().min(3)].join(", ")
        ),
        (Some(title), true) => {
            format!("Experienced {title} passionate about delivering quality work and making an impact.")
        }
        (None, false) => format!(
            "Professional with expertise in {}. Dedicated to continuous learning and excellence.",
            skills.join(", ")
        ),
        (None, true) => "Dedicated professional committed to excellence and continuous growth.".to_string(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn prefer<'a, T>(enhanced: &'a [T], original: &'a [T]) -> &'a [T] {
    if enhanced.is_empty() {
        original
    } else {
        enhanced
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    About,
    Experience,
    Projects,
    Skills,
    Education,
    Certifications,
    Awards,
    Activities,
    Publications,
}

impl Section {
    fn id(self) -> &'static str {
        match self {
            Section::About => "about",
            Section::Experience => "experience",
            Section::Projects => "projects",
            Section::Skills => "skills",
            Section::Education => "education",
            Section::Certifications => "certifications",
            Section::Awards => "awards",
            Section::Activities => "activities",
            Section::Publications => "publications",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Section::About => "About",
            Section::Experience => "Experience",
            Section::Projects => "Projects",
            Section::Skills => "Skills",
            Section::Education => "Education",
            Section::Certifications => "Certifications",
            Section::Awards => "Awards",
            Section::Activities => "Activities",
            Section::Publications => "Publications",
        }
    }
}

fn render_portfolio(
    resume: &StructuredResume,
    content: &EnhancedContent,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let name = display_name(resume);
    let headline = non_empty(&content.headline).unwrap_or_else(|| derive_headline(resume));
    let about = non_empty(&content.about).unwrap_or_else(|| resume.summary.trim().to_string());

    let mut sections: Vec<(Section, String)> = Vec::new();
    let mut push = |section: Section, body: Option<String>| {
        if let Some(body) = body {
            sections.push((section, body));
        }
    };
    push(Section::About, about_block(&about)?);
    push(
        Section::Experience,
        experience_block(prefer(&content.enhanced_experience, &resume.experience))?,
    );
    push(
        Section::Projects,
        projects_block(prefer(&content.enhanced_projects, &resume.projects))?,
    );
    push(Section::Skills, skills_block(&resume.skills)?);
    push(Section::Education, education_block(&resume.education)?);
    for (section, enhanced, original) in [
        (Section::Certifications, &content.enhanced_certifications, &resume.certifications),
        (Section::Awards, &content.enhanced_awards, &resume.awards),
        (Section::Activities, &content.enhanced_activities, &resume.activities),
        (Section::Publications, &content.enhanced_publications, &resume.publications),
    ] {
        push(section, list_block(section, prefer(enhanced, original))?);
    }

    let description: String = if about.is_empty() { &headline } else { &about }
        .chars()
        .take(META_DESCRIPTION_CHARS)
        .collect();
    let page_title = if name.is_empty() { "Portfolio".to_string() } else { name.clone() };

    let mut out = String::with_capacity(16 * 1024);
    write!(
        out,
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="description" content="{description}">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<nav class="nav"><div class="container">
<a href="#top" class="nav-brand">{initials}</a>
<div class="nav-links">
"##,
        description = escape(&description),
        title = escape(&page_title),
        style = template::STYLE,
        initials = escape(&initials(&name)),
    )?;
    for (section, _) in &sections {
        writeln!(
            out,
            r##"<a href="#{}" class="nav-link">{}</a>"##,
            section.id(),
            section.label()
        )?;
    }
    out.push_str("</div>\n</div></nav>\n");

    hero(&mut out, resume, &name, &headline, &content.highlights, options)?;
    for (_, body) in &sections {
        out.push_str(body);
    }
    footer(&mut out, resume, &name)?;

    write!(out, "<script>{}</script>\n</body>\n</html>\n", template::SCRIPT)?;
    Ok(out)
}

fn hero(
    out: &mut String,
    resume: &StructuredResume,
    name: &str,
    headline: &str,
    highlights: &[String],
    options: &RenderOptions,
) -> fmt::Result {
    out.push_str(r#"<header class="hero" id="top"><div class="container hero-inner">"#);
    match options.photo_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => write!(
            out,
            r#"<div class="hero-avatar"><img src="{}" alt="{}"></div>"#,
            escape(url),
            escape(name)
        )?,
        None => write!(out, r#"<div class="hero-avatar">{}</div>"#, escape(&initials(name)))?,
    }
    write!(
        out,
        r#"<div><div class="hero-role">{role}</div><h1 class="hero-name">{name}</h1><p class="hero-headline">{headline}</p>"#,
        role = escape(&derive_role(resume)),
        name = escape(name),
        headline = escape(headline),
    )?;
    let highlights: Vec<&str> = highlights
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();
    if !highlights.is_empty() {
        out.push_str(r#"<ul class="highlights">"#);
        for h in highlights {
            write!(out, "<li>{}</li>", escape(h))?;
        }
        out.push_str("</ul>");
    }
    out.push_str("</div></div></header>\n");
    Ok(())
}

fn section_open(out: &mut String, section: Section, label: &str, title: &str) -> fmt::Result {
    write!(
        out,
        r#"<section class="{id}" id="{id}"><div class="container"><div class="section-label">{label}</div><h2 class="section-title">{title}</h2>"#,
        id = section.id(),
        label = escape(label),
        title = escape(title),
    )
}

const SECTION_CLOSE: &str = "</div></section>\n";

fn about_block(about: &str) -> Result<Option<String>, fmt::Error> {
    if about.trim().is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, Section::About, "Introduction", "About Me")?;
    out.push_str(r#"<div class="about-text">"#);
    for paragraph in RE_PARAGRAPH_BREAK
        .split(about.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(ABOUT_PARAGRAPHS)
    {
        write!(out, "<p>{}</p>", escape(&clamp_words(paragraph, ABOUT_PARAGRAPH_WORDS)))?;
    }
    write!(
        out,
        "<a href=\"#contact\" class=\"btn-outline\">Get In Touch {}</a></div>",
        template::ARROW_ICON
    )?;
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

/// Multi-line descriptions become bullet lists; a single line stays a paragraph.
fn split_bullets(text: &str) -> Vec<String> {
    let raw = text.trim();
    let mut parts: Vec<String> = raw.lines().map(strip_bullet).filter(|s| !s.is_empty()).collect();
    if parts.len() <= 1 && raw.contains('•') {
        parts = raw.split('•').map(strip_bullet).filter(|s| !s.is_empty()).collect();
    }
    if parts.len() <= 1 {
        return Vec::new();
    }
    parts.truncate(MAX_BULLETS);
    parts
}

fn experience_block(entries: &[ExperienceEntry]) -> Result<Option<String>, fmt::Error> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, Section::Experience, "Career", "Work Experience")?;
    out.push_str(r#"<div class="experience-grid">"#);
    for exp in entries {
        write!(
            out,
            r#"<div class="exp-card"><div class="exp-header"><div><h3 class="exp-title">{}</h3><div class="exp-company">{}</div></div><span class="exp-date">{}</span></div>"#,
            escape(&exp.title),
            escape(&exp.company),
            escape(&exp.dates),
        )?;
        let bullets = split_bullets(&exp.description);
        if bullets.is_empty() {
            write!(out, r#"<p class="exp-desc">{}</p>"#, escape(exp.description.trim()))?;
        } else {
            out.push_str(r#"<ul class="exp-bullets">"#);
            for b in &bullets {
                write!(out, "<li>{}</li>", escape(b))?;
            }
            out.push_str("</ul>");
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

fn projects_block(entries: &[ProjectEntry]) -> Result<Option<String>, fmt::Error> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, Section::Projects, "Portfolio", "Selected Projects")?;
    out.push_str(r#"<div class="projects-grid">"#);
    for (index, project) in entries.iter().enumerate() {
        write!(
            out,
            r#"<div class="project-card"><div class="project-image"><span class="project-image-placeholder">{:02}</span></div><h3 class="project-name">{}</h3><p class="project-desc">{}</p>"#,
            index + 1,
            escape(&project.name),
            escape(&project.description),
        )?;
        let tags: Vec<&str> = project
            .technologies
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            out.push_str(r#"<div class="project-tech">"#);
            for tag in tags {
                write!(out, r#"<span class="tech-tag">{}</span>"#, escape(tag))?;
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

fn skills_block(skills: &[String]) -> Result<Option<String>, fmt::Error> {
    let groups = skills::group_skills(skills);
    if groups.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, Section::Skills, "Expertise", "Skills & Competencies")?;
    out.push_str(r#"<div class="skills-accordion">"#);
    for (index, group) in groups.iter().enumerate() {
        write!(
            out,
            r#"<div class="skill-item{open}"><div class="skill-header"><span class="skill-name">{name}</span>{icon}</div><div class="skill-content"><div class="skill-tags">"#,
            open = if index == 0 { " open" } else { "" },
            name = escape(group.name),
            icon = template::PLUS_ICON,
        )?;
        for skill in &group.skills {
            write!(out, r#"<span class="skill-tag">{}</span>"#, escape(skill))?;
        }
        out.push_str("</div></div></div>");
    }
    out.push_str("</div>");
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

fn education_block(entries: &[EducationEntry]) -> Result<Option<String>, fmt::Error> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, Section::Education, "Background", "Education")?;
    out.push_str(r#"<div class="education-grid">"#);
    for edu in entries {
        out.push_str(r#"<div class="edu-card">"#);
        for (class, value) in [("edu-degree", &edu.degree), ("edu-school", &edu.school), ("edu-year", &edu.year)] {
            if !value.trim().is_empty() {
                write!(out, r#"<div class="{class}">{}</div>"#, escape(value.trim()))?;
            }
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

fn list_block(section: Section, items: &[String]) -> Result<Option<String>, fmt::Error> {
    let items: Vec<String> = items
        .iter()
        .map(|i| strip_bullet(i))
        .filter(|i| !i.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect();
    if items.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    section_open(&mut out, section, section.label(), section.label())?;
    out.push_str(r#"<div class="list-section-grid">"#);
    for item in &items {
        write!(out, r#"<div class="list-item">{}</div>"#, escape(item))?;
    }
    out.push_str("</div>");
    out.push_str(SECTION_CLOSE);
    Ok(Some(out))
}

fn footer(out: &mut String, resume: &StructuredResume, name: &str) -> fmt::Result {
    out.push_str(
        r#"<footer class="footer" id="contact"><div class="container"><h2 class="footer-title">Let's work together</h2><div class="footer-contact">"#,
    );
    let email = resume.email.trim();
    if !email.is_empty() {
        write!(
            out,
            r#"<a href="mailto:{0}" class="footer-contact-link">{0}</a>"#,
            escape(email)
        )?;
    }
    let phone = resume.phone.trim();
    if !phone.is_empty() {
        write!(
            out,
            r#"<a href="tel:{0}" class="footer-contact-link">{0}</a>"#,
            escape(phone)
        )?;
    }
    let linkedin = resume.linkedin.trim();
    if !linkedin.is_empty() {
        let href = if linkedin.starts_with("http") {
            linkedin.to_string()
        } else {
            format!("https://{linkedin}")
        };
        write!(
            out,
            r#"<a href="{}" target="_blank" rel="noopener" class="footer-contact-link">LinkedIn</a>"#,
            escape(&href)
        )?;
    }
    write!(
        out,
        r#"</div><p class="footer-note">&copy; {}</p></div></footer>"#,
        escape(if name.is_empty() { "Portfolio" } else { name })
    )?;
    out.push('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> StructuredResume {
        StructuredResume {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            experience: vec![ExperienceEntry {
                title: "Senior Engineer, Platform".into(),
                company: "Acme".into(),
                dates: "2020-2023".into(),
                description: "Built the billing pipeline\nMigrated services to Rust".into(),
            }],
            ..Default::default()
        }
    }

    fn render(resume: &StructuredResume, content: &EnhancedContent) -> String {
        PortfolioRenderer
            .render(resume, content, &RenderOptions::default())
            .unwrap()
    }

    fn nav_links(html: &str) -> Vec<String> {
        html.split(r##"<a href="#"##)
            .skip(1)
            .filter_map(|rest| {
                let (id, tail) = rest.split_once('"')?;
                tail.starts_with(r#" class="nav-link""#).then(|| id.to_string())
            })
            .collect()
    }

    #[test]
    fn test_renders_name_and_experience() {
        let html = render(&jane(), &EnhancedContent::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Jane Doe"));
        assert!(html.contains(r#"<h3 class="exp-title">Senior Engineer, Platform</h3>"#));
        assert!(html.contains("<li>Built the billing pipeline</li>"));
        assert!(html.contains(r#"<div class="hero-role">Engineer</div>"#));
        assert!(html.contains("mailto:jane@x.com"));
    }

    #[test]
    fn test_nav_brand_links_to_top() {
        let html = render(&jane(), &EnhancedContent::default());
        assert!(html.contains(r##"<a href="#top" class="nav-brand">JD</a>"##));
        assert!(html.contains(r#"<header class="hero" id="top">"#));
        assert!(html.contains("<title>Jane Doe</title>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_nav_matches_present_sections() {
        let html = render(&jane(), &EnhancedContent::default());
        assert_eq!(nav_links(&html), vec!["experience"]);

        let mut resume = jane();
        resume.summary = "Engineer who ships.".into();
        resume.skills = vec!["Rust".into()];
        resume.awards = vec!["• Hackathon winner".into()];
        resume.publications = vec!["Paper on queues".into()];
        let html = render(&resume, &EnhancedContent::default());
        assert_eq!(
            nav_links(&html),
            vec!["about", "experience", "skills", "awards", "publications"]
        );
        assert!(html.contains(r#"<div class="list-item">Hackathon winner</div>"#));
        assert!(!html.contains(r#"id="projects""#));
        assert!(!html.contains(r#"id="education""#));
    }

    #[test]
    fn test_empty_resume_still_renders() {
        let html = render(&StructuredResume::default(), &EnhancedContent::default());
        assert!(html.contains("<title>Portfolio</title>"));
        assert!(html.contains(r#"<div class="hero-avatar">P</div>"#));
        assert!(html.contains("Dedicated professional committed to excellence"));
        assert!(nav_links(&html).is_empty());
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut resume = jane();
        resume.name = "<script>alert(1)</script>".into();
        resume.skills = vec!["C++ & \"Rust\"".into()];
        let content = EnhancedContent {
            headline: "Fast & <b>safe</b>".into(),
            ..Default::default()
        };
        let html = render(&resume, &content);
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Fast &amp; &lt;b&gt;safe&lt;/b&gt;"));
        assert!(html.contains("C++ &amp; &quot;Rust&quot;"));
    }

    #[test]
    fn test_enhanced_copy_preferred_over_resume() {
        let content = EnhancedContent {
            headline: "Platform engineer".into(),
            about: "Polished about.".into(),
            enhanced_projects: vec![ProjectEntry {
                name: "Ledger".into(),
                description: "Double-entry core".into(),
                technologies: "Rust, Postgres".into(),
            }],
            ..Default::default()
        };
        let html = render(&jane(), &content);
        assert!(html.contains(r#"<p class="hero-headline">Platform engineer</p>"#));
        assert!(html.contains("<p>Polished about.</p>"));
        assert!(html.contains(r#"<span class="project-image-placeholder">01</span>"#));
        assert!(html.contains(r#"<span class="tech-tag">Postgres</span>"#));
        assert!(html.contains(r#"content="Polished about.""#));
    }

    #[test]
    fn test_photo_replaces_initials() {
        let options = RenderOptions {
            photo_url: Some("http://localhost:8080/uploads/p.jpg".into()),
        };
        let html = PortfolioRenderer
            .render(&jane(), &EnhancedContent::default(), &options)
            .unwrap();
        assert!(html.contains(r#"<img src="http://localhost:8080/uploads/p.jpg" alt="Jane Doe">"#));
    }

    #[test]
    fn test_placeholder_name_derived_from_email() {
        let resume = StructuredResume {
            name: "Your Name".into(),
            email: "john.smith_jr@example.com".into(),
            ..Default::default()
        };
        assert_eq!(display_name(&resume), "John Smith Jr");
        assert_eq!(initials("John Smith Jr"), "JJ");
    }

    #[test]
    fn test_role_derivation() {
        let mut resume = StructuredResume {
            skills: vec!["Go".into(), "Python".into()],
            ..Default::default()
        };
        assert_eq!(derive_role(&resume), "Python Developer");

        resume.experience = vec![ExperienceEntry {
            title: "Various duties".into(),
            ..Default::default()
        }];
        assert_eq!(derive_role(&resume), "Python Developer");

        resume.skills.clear();
        assert_eq!(derive_role(&resume), "Professional");
    }

    #[test]
    fn test_bullets() {
        assert!(split_bullets("One line only").is_empty());
        assert_eq!(split_bullets("• A • B"), vec!["A", "B"]);
        let many = (1..=8).map(|i| format!("- item {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(split_bullets(&many).len(), MAX_BULLETS);
    }

    #[test]
    fn test_about_limited_to_two_paragraphs() {
        let html = render(
            &StructuredResume {
                summary: "First.\n\nSecond.\n\nThird.".into(),
                ..Default::default()
            },
            &EnhancedContent::default(),
        );
        assert!(html.contains("<p>First.</p><p>Second.</p>"));
        assert!(!html.contains("<p>Third.</p>"));
    }

    #[test]
    fn test_fallback_document_uses_name_headline_about() {
        let content = EnhancedContent {
            headline: "Engineer".into(),
            about: "About text".into(),
            ..Default::default()
        };
        let html = fallback_document(&jane(), &content);
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains("<h2>Engineer</h2>"));
        assert!(html.contains("<pre>About text</pre>"));
    }
}
