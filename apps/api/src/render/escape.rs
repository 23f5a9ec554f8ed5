use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static RE_LEADING_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s\u{FFFD}\u{E000}-\u{F8FF}]+").unwrap());

static RE_BULLET_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•·●▪◦‣⁃\-–—*]+\s*").unwrap());

/// HTML-escapes text for element content and quoted attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Removes decoding debris and a leading bullet glyph from a list line.
pub fn strip_bullet(line: &str) -> String {
    let line = RE_LEADING_JUNK.replace(line, "");
    RE_BULLET_PREFIX.replace(&line, "").trim().to_string()
}
