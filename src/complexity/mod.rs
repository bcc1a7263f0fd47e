//! Text complexity analysis.
//!
//! Turns raw input text into the entropy/complexity signals that drive the
//! rest of the controller:
//!
//! ```text
//! text ─┬─ entropy (bits) → normalize → level (low / medium / high)
//!       ├─ cognitive_depth     (reasoning keyword density)
//!       ├─ abstraction_level   (abstract vs concrete phrase balance)
//!       └─ lexical_uncertainty (unique / total word tokens)
//! ```
//!
//! Every metric is a pure function of the text. None of them share state, so
//! they may be evaluated in any order.

pub mod keywords;
pub mod uncertainty;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use uncertainty::{lexical_uncertainty, normalize_uncertainty};

use keywords::{ABSTRACT_PHRASES, CONCRETE_PHRASES, REASONING_KEYWORDS};

/// Default ceiling used to normalise character entropy (8 bits per symbol).
pub const DEFAULT_MAX_ENTROPY: f64 = 8.0;

/// Normalised entropy below this is `Low`.
pub const LOW_CEILING: f64 = 0.3;

/// Normalised entropy below this (and at least `LOW_CEILING`) is `Medium`.
pub const MEDIUM_CEILING: f64 = 0.7;

/// Abstraction level reported when neither phrase set occurs.
pub const NEUTRAL_ABSTRACTION: f64 = 0.5;

// ============================================================================
// Entropy level
// ============================================================================

/// Coarse complexity bucket derived from normalised entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyLevel {
    Low,
    Medium,
    High,
}

impl EntropyLevel {
    /// All levels in ascending order.
    pub const ALL: [EntropyLevel; 3] = [Self::Low, Self::Medium, Self::High];

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for EntropyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metrics record
// ============================================================================

/// Complexity signals for one input text. Built fresh each turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// Character Shannon entropy in bits.
    pub entropy: f64,
    /// `entropy / max_possible`, capped at 1.0.
    pub normalized_entropy: f64,
    /// Bucket of `normalized_entropy`.
    pub level: EntropyLevel,
    /// Fraction of tokens that are reasoning keywords, in [0, 1].
    pub cognitive_depth: f64,
    /// Share of abstract phrases among abstract + concrete hits, in [0, 1].
    pub abstraction_level: f64,
}

// ============================================================================
// Analyzer
// ============================================================================

/// Stateless text complexity analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    /// Compute every metric for `text`.
    pub fn analyze(text: &str) -> ComplexityMetrics {
        let entropy = Self::entropy(text);
        let normalized_entropy = Self::normalize(entropy, DEFAULT_MAX_ENTROPY);
        ComplexityMetrics {
            entropy,
            normalized_entropy,
            level: Self::level(normalized_entropy),
            cognitive_depth: Self::cognitive_depth(text),
            abstraction_level: Self::abstraction_level(text),
        }
    }

    /// Shannon entropy (bits) of the raw character distribution.
    ///
    /// No case folding or normalisation is applied. Empty text has entropy 0.
    pub fn entropy(text: &str) -> f64 {
        let mut counts: HashMap<char, usize> = HashMap::new();
        let mut len = 0usize;
        for ch in text.chars() {
            *counts.entry(ch).or_insert(0) += 1;
            len += 1;
        }
        if len == 0 {
            return 0.0;
        }

        let len = len as f64;
        let entropy = counts
            .values()
            .map(|&count| {
                let p = count as f64 / len;
                -p * p.log2()
            })
            .sum::<f64>();
        // A single repeated symbol yields -0.0.
        entropy.max(0.0)
    }

    /// Scale entropy into [0, 1] against `max_possible` bits.
    pub fn normalize(entropy: f64, max_possible: f64) -> f64 {
        if max_possible <= 0.0 {
            return 1.0;
        }
        (entropy / max_possible).min(1.0)
    }

    /// Bucket a normalised entropy. Boundaries belong to the upper bucket.
    pub fn level(normalized: f64) -> EntropyLevel {
        if normalized < LOW_CEILING {
            EntropyLevel::Low
        } else if normalized < MEDIUM_CEILING {
            EntropyLevel::Medium
        } else {
            EntropyLevel::High
        }
    }

    /// Fraction of whitespace tokens (case-folded) that are reasoning keywords.
    pub fn cognitive_depth(text: &str) -> f64 {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            return 0.0;
        }
        let hits = tokens
            .iter()
            .filter(|t| REASONING_KEYWORDS.contains(&t.as_str()))
            .count();
        hits as f64 / tokens.len() as f64
    }

    /// Balance of abstract against concrete phrase occurrences.
    ///
    /// Counts case-insensitive, non-overlapping substring hits. Returns
    /// [`NEUTRAL_ABSTRACTION`] when neither set occurs.
    pub fn abstraction_level(text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let abstract_count = count_phrases(&lowered, ABSTRACT_PHRASES);
        let concrete_count = count_phrases(&lowered, CONCRETE_PHRASES);
        let total = abstract_count + concrete_count;
        if total == 0 {
            return NEUTRAL_ABSTRACTION;
        }
        abstract_count as f64 / total as f64
    }
}

fn count_phrases(haystack: &str, phrases: &[&str]) -> usize {
    phrases
        .iter()
        .map(|phrase| haystack.matches(phrase).count())
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn distinct_chars(text: &str) -> usize {
        text.chars().collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_entropy_empty_and_single_symbol() {
        assert_eq!(ComplexityAnalyzer::entropy(""), 0.0);
        assert_eq!(ComplexityAnalyzer::entropy("aaaa"), 0.0);
    }

    #[test]
    fn test_entropy_bounded_by_distinct_symbols() {
        let samples = [
            "a",
            "ab",
            "abcd",
            "hello world",
            "Mengapa langit berwarna biru?",
            "ñandú ünïcödé ✓✓",
            "The quick brown fox jumps over the lazy dog",
        ];
        for text in samples {
            let h = ComplexityAnalyzer::entropy(text);
            let bound = (distinct_chars(text).max(1) as f64).log2();
            assert!(h >= 0.0, "{:?} gave negative entropy {}", text, h);
            assert!(h <= bound + 1e-9, "{:?}: {} > {}", text, h, bound);
        }
    }

    #[test]
    fn test_entropy_uniform_two_symbols_is_one_bit() {
        let h = ComplexityAnalyzer::entropy("abab");
        assert!((h - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_is_case_sensitive() {
        assert_eq!(ComplexityAnalyzer::entropy("AAAA"), 0.0);
        assert!((ComplexityAnalyzer::entropy("aA") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_monotonic_and_capped() {
        let mut previous = -1.0;
        for i in 0..200 {
            let e = i as f64 * 0.1;
            let n = ComplexityAnalyzer::normalize(e, DEFAULT_MAX_ENTROPY);
            assert!(n >= previous);
            assert!(n <= 1.0);
            previous = n;
        }
        assert_eq!(ComplexityAnalyzer::normalize(16.0, 8.0), 1.0);
        assert_eq!(ComplexityAnalyzer::normalize(4.0, 8.0), 0.5);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ComplexityAnalyzer::level(0.0), EntropyLevel::Low);
        assert_eq!(ComplexityAnalyzer::level(0.29999), EntropyLevel::Low);
        assert_eq!(ComplexityAnalyzer::level(0.3), EntropyLevel::Medium);
        assert_eq!(ComplexityAnalyzer::level(0.69999), EntropyLevel::Medium);
        assert_eq!(ComplexityAnalyzer::level(0.7), EntropyLevel::High);
        assert_eq!(ComplexityAnalyzer::level(1.0), EntropyLevel::High);
    }

    #[test]
    fn test_analyze_scenarios() {
        let m = ComplexityAnalyzer::analyze("aaaa");
        assert_eq!(m.entropy, 0.0);
        assert_eq!(m.level, EntropyLevel::Low);

        let m = ComplexityAnalyzer::analyze("");
        assert_eq!(m.entropy, 0.0);
        assert_eq!(m.level, EntropyLevel::Low);
        assert_eq!(m.cognitive_depth, 0.0);
        assert_eq!(m.abstraction_level, NEUTRAL_ABSTRACTION);
    }

    #[test]
    fn test_cognitive_depth_counts_keywords() {
        // "why" and "strategy" hit after case folding.
        let depth = ComplexityAnalyzer::cognitive_depth("Why does this Strategy fail here");
        assert!((depth - 2.0 / 6.0).abs() < 1e-12);

        let depth = ComplexityAnalyzer::cognitive_depth("Bagaimana dampak inflasi");
        assert!((depth - 2.0 / 3.0).abs() < 1e-12);

        assert_eq!(ComplexityAnalyzer::cognitive_depth("   "), 0.0);
    }

    #[test]
    fn test_abstraction_level() {
        assert_eq!(
            ComplexityAnalyzer::abstraction_level("nothing to see"),
            NEUTRAL_ABSTRACTION
        );
        assert_eq!(ComplexityAnalyzer::abstraction_level("The THEORY of it"), 1.0);
        assert_eq!(ComplexityAnalyzer::abstraction_level("give an example"), 0.0);
        let mixed = ComplexityAnalyzer::abstraction_level("a concept with one example");
        assert!((mixed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&EntropyLevel::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        assert_eq!(EntropyLevel::High.to_string(), "high");
    }
}
