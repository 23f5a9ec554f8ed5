use crate::llm_client::prompts::GROUNDING_INSTRUCTION;

use super::fallback::{ABOUT_MAX_WORDS, HEADLINE_MAX_WORDS, HIGHLIGHT_MAX_WORDS, MAX_HIGHLIGHTS};

/// Builds the rewrite prompt around the serialized résumé.
pub fn enhancement_prompt(resume_json: &str) -> String {
    format!(
        r#"You are a senior recruiter and resume writer. Rewrite the content below so it reads well on a personal portfolio site while staying strictly factual.

{GROUNDING_INSTRUCTION}

STYLE:
- Think in Situation/Task/Action/Result terms, but omit the result when the input does not state one.
- Experience: 3 to 5 concise, action-led bullets per role.
- Prefer: action verb + what was done + scope or tech + outcome (only if present).

Resume data:
{resume_json}

Tasks:
1. A headline for the hero section, at most {HEADLINE_MAX_WORDS} words.
2. Up to {MAX_HIGHLIGHTS} one-line highlights, each at most {HIGHLIGHT_MAX_WORDS} words.
3. An About paragraph of at most {ABOUT_MAX_WORDS} words. No education list, phone, email or long dumps.
4. Rewrite each experience entry; return "description" as a multi-line string, one bullet per line, each prefixed with "- ".
5. Clarify project descriptions without adding facts.
6. Tighten certifications, awards, activities and publications (if present) without adding facts.

Return ONLY a JSON object of this shape:
{{
  "headline": "...",
  "highlights": ["..."],
  "about": "...",
  "enhancedExperience": [{{"title": "...", "company": "...", "dates": "...", "description": "- ...\n- ..."}}],
  "enhancedProjects": [{{"name": "...", "description": "...", "technologies": "..."}}],
  "enhancedCertifications": ["..."],
  "enhancedAwards": ["..."],
  "enhancedActivities": ["..."],
  "enhancedPublications": ["..."]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_resume_and_limits() {
        let prompt = enhancement_prompt(r#"{"name":"Jane Doe"}"#);
        assert!(prompt.contains(r#"{"name":"Jane Doe"}"#));
        assert!(prompt.contains("at most 14 words"));
        assert!(prompt.contains("at most 90 words"));
        assert!(prompt.contains("Do NOT invent metrics"));
    }
}
