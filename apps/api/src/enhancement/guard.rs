//! Rejects generated copy that introduces figures absent from the résumé.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:[.,]\d+)?%").unwrap());

static RE_CURRENCY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:USD|MYR|RM|EUR|GBP)\s*\d+(?:[.,]\d+)?").unwrap());

static RE_CURRENCY_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£]\s*\d+(?:[.,]\d+)?").unwrap());

/// Percentage and currency tokens in `text`, normalised for comparison.
pub fn metric_tokens(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for m in RE_PERCENT.find_iter(text) {
        tokens.insert(m.as_str().replace(',', ""));
    }
    for m in RE_CURRENCY_CODE.find_iter(text) {
        tokens.insert(m.as_str().replace(',', "").to_uppercase());
    }
    for m in RE_CURRENCY_SYMBOL.find_iter(text) {
        tokens.insert(m.as_str().replace(',', ""));
    }
    tokens
}

/// Tokens present in `output` but not in `input`.
pub fn new_metric_tokens(input: &str, output: &str) -> Vec<String> {
    let known = metric_tokens(input);
    metric_tokens(output)
        .into_iter()
        .filter(|t| !known.contains(t))
        .collect()
}
