use crate::models::resume::StructuredResume;

const WEIGHTS: [(&str, f32); 6] = [
    ("name", 0.20),
    ("email", 0.20),
    ("phone", 0.10),
    ("experience", 0.25),
    ("education", 0.15),
    ("skills", 0.10),
];

/// Share of the key fields that came out non-empty, in `0.0..=1.0`.
pub fn score(resume: &StructuredResume) -> f32 {
    WEIGHTS
        .iter()
        .filter(|(field, _)| match *field {
            "name" => !resume.name.is_empty(),
            "email" => !resume.email.is_empty(),
            "phone" => !resume.phone.is_empty(),
            "experience" => !resume.experience.is_empty(),
            "education" => !resume.education.is_empty(),
            "skills" => !resume.skills.is_empty(),
            _ => false,
        })
        .map(|(_, weight)| weight)
        .sum::<f32>()
        .min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_resume_scores_zero() {
        assert_eq!(score(&StructuredResume::default()), 0.0);
    }

    #[test]
    fn test_contact_only() {
        let resume = StructuredResume {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            ..Default::default()
        };
        assert!((score(&resume) - 0.4).abs() < 1e-6);
    }
}
