//! Cognitive and processing style dimensions.
//!
//! A persona draws one label from each binary pair. The label determines
//! what the persona deliberately does *not* do, and how a finished response
//! is rewritten to stay in character.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Dimension labels
// ============================================================================

/// How the persona reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveStyle {
    Analytical,
    Emotive,
}

impl CognitiveStyle {
    pub const ALL: [CognitiveStyle; 2] = [Self::Analytical, Self::Emotive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytical => "Analytical",
            Self::Emotive => "Emotive",
        }
    }

    /// The mode of reasoning this style leaves out.
    pub fn limitation(&self) -> &'static str {
        match self {
            Self::Analytical => "Feeling (subjective emotion)",
            Self::Emotive => "Thinking (logical analysis)",
        }
    }
}

impl fmt::Display for CognitiveStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the persona organises its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStyle {
    Structured,
    Exploratory,
}

impl ProcessingStyle {
    pub const ALL: [ProcessingStyle; 2] = [Self::Structured, Self::Exploratory];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "Structured",
            Self::Exploratory => "Exploratory",
        }
    }

    /// The mode of organisation this style leaves out.
    pub fn limitation(&self) -> &'static str {
        match self {
            Self::Structured => "Perceiving (open exploration)",
            Self::Exploratory => "Judging (structured evaluation)",
        }
    }
}

impl fmt::Display for ProcessingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Profile
// ============================================================================

/// One cognitive style plus one processing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionProfile {
    #[serde(rename = "cognitive_style")]
    pub cognitive: CognitiveStyle,
    #[serde(rename = "processing_style")]
    pub processing: ProcessingStyle,
}

impl DimensionProfile {
    pub fn new(cognitive: CognitiveStyle, processing: ProcessingStyle) -> Self {
        Self {
            cognitive,
            processing,
        }
    }

    /// Labels of the modes this profile leaves out.
    pub fn limitations(&self) -> [&'static str; 2] {
        [self.cognitive.limitation(), self.processing.limitation()]
    }

    /// One-line description suitable for a responder prompt.
    pub fn constraint_description(&self) -> String {
        format!(
            "{} / {} persona; avoids {}",
            self.cognitive,
            self.processing,
            self.limitations().join(" and ")
        )
    }

    /// Rewrite `text` so it reads in this profile's cognitive register.
    ///
    /// Analytical swaps "I feel" for "analysis shows"; Emotive swaps
    /// "data shows" for "I sense". Matching is case-sensitive.
    pub fn apply_constraints(&self, text: &str) -> String {
        match self.cognitive {
            CognitiveStyle::Analytical => text.replace("I feel", "analysis shows"),
            CognitiveStyle::Emotive => text.replace("data shows", "I sense"),
        }
    }
}

impl fmt::Display for DimensionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cognitive, self.processing)
    }
}

// ============================================================================
// Tests
// ============================================================================
