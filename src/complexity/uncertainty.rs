//! Lexical uncertainty: how spread out the vocabulary of a text is.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Ratio of unique to total word tokens in the lowercased text.
///
/// Returns 0.0 when the text has no word tokens.
pub fn lexical_uncertainty(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = tokens.iter().copied().collect();
    unique.len() as f64 / tokens.len() as f64
}

/// Clamp an uncertainty value into [0, 1].
pub fn normalize_uncertainty(uncertainty: f64) -> f64 {
    uncertainty.clamp(0.0, 1.0)
}
