// Shared prompt constants. The enhancement prompt itself lives in
// enhancement/prompts.rs alongside the code that uses it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction prepended to every rewriting prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL RULES (anti-hallucination):\n\
    - Use ONLY information present in the input resume data.\n\
    - Do NOT invent metrics, numbers, company names, job titles, dates, tools, or achievements.\n\
    - If a result or impact is not explicitly stated, do NOT fabricate it.\n\
    - If you cannot improve a line without inventing facts, keep it close to the original wording \
    and just improve clarity.";
