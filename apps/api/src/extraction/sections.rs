use once_cell::sync::Lazy;
use regex::Regex;

/// Résumé sections recognised by a heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Awards,
    Activities,
    Publications,
}

static HEADINGS: Lazy<Vec<(Section, Regex)>> = Lazy::new(|| {
    let heading = |words: &str| Regex::new(&format!(r"(?i)^\s*(?:{words})\s*:?\s*$")).unwrap();
    vec![
        (
            Section::Summary,
            heading(r"(?:PROFESSIONAL\s+)?SUMMARY|PROFILE|ABOUT\s+ME|OBJECTIVE"),
        ),
        (
            Section::Experience,
            heading(r"(?:WORK\s+|PROFESSIONAL\s+)?EXPERIENCE|WORK\s+HISTORY|EMPLOYMENT"),
        ),
        (Section::Education, heading(r"EDUCATION|ACADEMIC(?:\s+BACKGROUND)?")),
        (
            Section::Skills,
            heading(r"(?:TECHNICAL\s+)?SKILLS|(?:CORE\s+)?COMPETENCIES"),
        ),
        (Section::Projects, heading(r"PROJECTS|PORTFOLIO")),
        (Section::Certifications, heading(r"CERTIFICATIONS?|CERTIFICATES?")),
        (Section::Awards, heading(r"AWARDS?|ACHIEVEMENTS?")),
        (Section::Activities, heading(r"ACTIVITIES|VOLUNTEER(?:ING)?")),
        (Section::Publications, heading(r"PUBLICATIONS?")),
    ]
});

impl Section {
    /// The section a line introduces, if it is a heading line.
    pub fn of_heading(line: &str) -> Option<Section> {
        HEADINGS
            .iter()
            .find(|(_, re)| re.is_match(line))
            .map(|(section, _)| *section)
    }
}

/// Lines between the first `section` heading and the next heading of any
/// section. Blank lines are kept so callers can split entries on them.
/// `None` when the heading never appears.
pub fn section_lines<'a>(lines: &[&'a str], section: Section) -> Option<Vec<&'a str>> {
    let start = lines
        .iter()
        .position(|l| Section::of_heading(l) == Some(section))?;

    Some(
        lines[start + 1..]
            .iter()
            .take_while(|l| Section::of_heading(l).is_none())
            .map(|l| if l.trim().is_empty() { "" } else { *l })
            .collect(),
    )
}

/// Splits section lines into blank-line-delimited blocks of trimmed, non-empty lines.
pub fn blocks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
