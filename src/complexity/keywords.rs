//! Fixed vocabularies used by the complexity metrics.
//!
//! English and Indonesian entries live side by side; matching is done on
//! case-folded input.

/// Tokens that signal reasoning demand.
pub const REASONING_KEYWORDS: &[&str] = &[
    // English
    "why",
    "how",
    "solution",
    "solve",
    "analysis",
    "analyze",
    "compare",
    "comparison",
    "impact",
    "strategy",
    "explain",
    "evaluate",
    "cause",
    "effect",
    // Indonesian
    "mengapa",
    "kenapa",
    "bagaimana",
    "solusi",
    "analisis",
    "perbandingan",
    "bandingkan",
    "dampak",
    "strategi",
    "jelaskan",
    "evaluasi",
    "penyebab",
];

/// Phrases that mark abstract discourse.
pub const ABSTRACT_PHRASES: &[&str] = &[
    "concept",
    "theory",
    "principle",
    "philosophy",
    "meaning",
    "abstract",
    "framework",
    "paradigm",
    "essence",
    "konsep",
    "teori",
    "prinsip",
    "filosofi",
    "makna",
    "hakikat",
];

/// Phrases that mark concrete discourse.
pub const CONCRETE_PHRASES: &[&str] = &[
    "example",
    "step",
    "data",
    "number",
    "specific",
    "instance",
    "case study",
    "how to",
    "contoh",
    "langkah",
    "angka",
    "spesifik",
    "kasus",
];

/// Interrogatives kept as the "meaning" of a short-term context.
pub const INTERROGATIVES: &[&str] = &[
    "what",
    "who",
    "why",
    "how",
    "when",
    "where",
    "which",
    "apa",
    "siapa",
    "kenapa",
    "mengapa",
    "bagaimana",
    "kapan",
    "dimana",
];
