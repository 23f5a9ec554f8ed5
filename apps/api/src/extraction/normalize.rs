use once_cell::sync::Lazy;
use regex::Regex;

static RE_UNKNOWN_GLYPHS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{FFFD}\x{E000}-\x{F8FF}\x{F0000}-\x{10FFFF}]").unwrap());

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\r\n]+").unwrap());

static RE_CONTROL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x{9F}]").unwrap());

/// Strips replacement characters, private-use glyphs and control characters
/// left behind by PDF decoding and collapses runs of horizontal whitespace.
/// Newlines survive so section headings can still be matched line by line.
pub fn normalize_text(raw: &str) -> String {
    let s = RE_UNKNOWN_GLYPHS.replace_all(raw, "");
    let s = RE_CONTROL.replace_all(&s, "");
    let s = RE_HORIZONTAL_WS.replace_all(&s, " ");
    s.trim().to_string()
}

/// Normalized text split into lines with trailing whitespace removed.
pub fn to_lines(normalized: &str) -> Vec<&str> {
    normalized.split('\n').map(str::trim_end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_pdf_artifacts_but_keeps_newlines() {
        let raw = "\u{E001}Jane\u{FFFD}   Doe\t\t\r\nEXPERIENCE\x07\n\n  Engineer  ";
        let text = normalize_text(raw);
        assert_eq!(text, "Jane Doe \r\nEXPERIENCE\n\n Engineer");
        assert_eq!(to_lines(&text), vec!["Jane Doe", "EXPERIENCE", "", " Engineer"]);
    }

    #[test]
    fn test_strips_supplementary_private_use_and_c1_controls() {
        let raw = "Jane\u{F0041} Doe\u{10FFFD}\x7F\n\u{0085}Skills\u{009F}: Rust";
        assert_eq!(normalize_text(raw), "Jane Doe\nSkills: Rust");
        assert_eq!(normalize_text("caf\u{00E9} \u{00A0}ok"), "caf\u{00E9} ok");
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t \n"), "");
        assert_eq!(to_lines(""), vec![""]);
    }
}
