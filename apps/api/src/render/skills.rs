/// A named group of skill tags.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillGroup<'a> {
    pub name: &'static str,
    pub skills: Vec<&'a str>,
}

const PROGRAMMING: &[&str] = &[
    "java", "python", "javascript", "typescript", "c++", "c#", "ruby", "php", "swift", "kotlin",
    "go", "golang", "rust", "sql", "html", "css", "r", "scala",
];

const FRAMEWORKS: &[&str] = &[
    "react", "angular", "vue", "node", "express", "django", "flask", "spring", "laravel", "rails",
    "next", "nuxt", ".net", "tensorflow", "pytorch",
];

const TOOLS: &[&str] = &[
    "git", "docker", "kubernetes", "aws", "azure", "gcp", "jenkins", "jira", "figma", "photoshop",
    "excel", "power bi", "tableau", "mysql", "mongodb", "postgresql",
];

const SOFT: &[&str] = &[
    "leadership", "communication", "teamwork", "problem", "analytical", "critical", "management",
    "presentation", "negotiation", "collaboration",
];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Programming Languages", PROGRAMMING),
    ("Frameworks & Libraries", FRAMEWORKS),
    ("Tools & Platforms", TOOLS),
    ("Soft Skills", SOFT),
];

/// Whole-token match, with prefix matching for longer keywords so that
/// `node.js` lands under `node` without `go` swallowing `django`.
fn mentions(skill: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return skill.contains(keyword);
    }
    skill
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .filter(|t| !t.is_empty())
        .any(|token| token == keyword || (keyword.len() >= 4 && token.starts_with(keyword)))
}

/// Groups skills by the first category whose keywords they mention. Skills
/// matching nothing go to "Other Skills"; when nothing matched at all the
/// whole list becomes a single "Technical Skills" group.
pub fn group_skills(skills: &[String]) -> Vec<SkillGroup<'_>> {
    let mut groups: Vec<SkillGroup> = CATEGORIES
        .iter()
        .map(|(name, _)| SkillGroup {
            name,
            skills: Vec::new(),
        })
        .collect();
    let mut other = Vec::new();

    for skill in skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let lower = skill.to_lowercase();
        match CATEGORIES
            .iter()
            .position(|(_, keywords)| keywords.iter().any(|k| mentions(&lower, k)))
        {
            Some(idx) => groups[idx].skills.push(skill),
            None => other.push(skill),
        }
    }

    if groups.iter().all(|g| g.skills.is_empty()) {
        return if other.is_empty() {
            Vec::new()
        } else {
            vec![SkillGroup {
                name: "Technical Skills",
                skills: other,
            }]
        };
    }

    groups.push(SkillGroup {
        name: "Other Skills",
        skills: other,
    });
    groups.retain(|g| !g.skills.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_in_fixed_order() {
        let skills = owned(&["Docker", "Rust", "Node.js", "Django", "Leadership", "Baking"]);
        let groups = group_skills(&skills);
        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "Programming Languages",
                "Frameworks & Libraries",
                "Tools & Platforms",
                "Soft Skills",
                "Other Skills"
            ]
        );
        assert_eq!(groups[0].skills, vec!["Rust"]);
        assert_eq!(groups[1].skills, vec!["Node.js", "Django"]);
        assert_eq!(groups[2].skills, vec!["Docker"]);
        assert_eq!(groups[4].skills, vec!["Baking"]);
    }

    #[test]
    fn test_uncategorised_skills_form_one_group() {
        let skills = owned(&["Baking", "Pottery"]);
        assert_eq!(
            group_skills(&skills),
            vec![SkillGroup {
                name: "Technical Skills",
                skills: vec!["Baking", "Pottery"],
            }]
        );
        assert!(group_skills(&[]).is_empty());
    }

    #[test]
    fn test_multi_word_keywords() {
        let skills = owned(&["Power BI dashboards", "Project Management"]);
        let groups = group_skills(&skills);
        assert_eq!(groups[0].name, "Tools & Platforms");
        assert_eq!(groups[1].name, "Soft Skills");
    }
}
