//! Turning raw input text into a short-term memory context.

use crate::complexity::keywords::INTERROGATIVES;
use crate::complexity::lexical_uncertainty;
use crate::memory::ShortTermContext;

/// Dimension of every state vector built by [`ContextBuilder`].
pub const CONTEXT_STATE_DIMENSION: usize = 3;

/// Builds the per-turn short-term context.
///
/// * `state` - `[character count, '?' count, word count]`
/// * `meaning` - the interrogative words of the text, or the whole text
///   lowercased when it has none
/// * `uncertainty` - lexical uncertainty of the text
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the context for `text`.
    pub fn build(&self, text: &str) -> ShortTermContext {
        ShortTermContext::new(Self::state(text), Self::meaning(text))
            .with_uncertainty(lexical_uncertainty(text))
    }

    /// `[character count, '?' count, word count]`.
    pub fn state(text: &str) -> Vec<f64> {
        let chars = text.chars().count();
        let questions = text.chars().filter(|c| *c == '?').count();
        let words = text.split_whitespace().count();
        vec![chars as f64, questions as f64, words as f64]
    }

    /// Interrogative words of `text` in order of appearance.
    ///
    /// Tokens are lowercased and stripped of surrounding punctuation before
    /// matching, so "Why?" counts.
    pub fn meaning(text: &str) -> String {
        let matches: Vec<String> = text
            .split_whitespace()
            .map(|token| {
                token
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|token| INTERROGATIVES.contains(&token.as_str()))
            .collect();

        if matches.is_empty() {
            text.to_lowercase()
        } else {
            matches.join(" ")
        }
    }
}
