//! Token-frequency memory.
//!
//! Per-task token counts, normalised on read. Two task types have a fixed
//! role: [`ANOMALY_BASELINE`] is the reference profile anomaly detection
//! compares against, and [`SYMBOLIC_BASELINE`] decides which tokens of a
//! symbolic expression are kept. Alongside sit scored strategies per game
//! type, each remembered with the token profile of its text.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Task type holding the reference profile for anomaly detection.
pub const ANOMALY_BASELINE: &str = "anomaly";

/// Task type holding token frequencies for symbolic simplification.
pub const SYMBOLIC_BASELINE: &str = "symbolic";

/// Deviation above which a token sequence counts as anomalous.
pub const ANOMALY_THRESHOLD: f64 = 0.3;

/// Baseline frequency a seen symbolic token needs to survive simplification.
pub const SYMBOLIC_KEEP_FREQUENCY: f64 = 0.1;

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());
static SYMBOL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]+|\d+|\S").unwrap());

/// Relative frequency of each lower-cased word in `text`.
pub fn token_distribution(text: &str) -> BTreeMap<String, f64> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_PATTERN.find_iter(&lowered).map(|m| m.as_str()).collect();
    frequencies(&words)
}

/// Split a symbolic expression into letter runs, digit runs and single
/// non-space symbols.
pub fn tokenize_symbolic(expr: &str) -> Vec<String> {
    SYMBOL_PATTERN
        .find_iter(expr)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn frequencies<S: AsRef<str>>(tokens: &[S]) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_ref().to_string()).or_insert(0) += 1;
    }
    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(token, count)| (token, count as f64 / total))
        .collect()
}

/// A strategy and the outcome it achieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub strategy: String,
    pub outcome: f64,
    /// Word frequencies of `strategy`.
    pub token_distribution: BTreeMap<String, f64>,
}

/// Token counts per task type plus remembered strategies per game type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMemory {
    counts: HashMap<String, BTreeMap<String, usize>>,
    strategies: HashMap<String, Vec<StrategyRecord>>,
}

impl TokenMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tokens` to the counts kept for `task_type`.
    pub fn observe<S: AsRef<str>>(&mut self, task_type: &str, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        let counts = self.counts.entry(task_type.to_string()).or_default();
        for token in tokens {
            *counts.entry(token.as_ref().to_string()).or_insert(0) += 1;
        }
        log::debug!(
            "observed {} tokens for task {} ({} distinct)",
            tokens.len(),
            task_type,
            counts.len()
        );
    }

    /// Task types with at least one observed token.
    pub fn task_types(&self) -> Vec<&str> {
        let mut tasks: Vec<&str> = self.counts.keys().map(String::as_str).collect();
        tasks.sort_unstable();
        tasks
    }

    /// Normalised token frequencies for `task_type`.
    pub fn distribution(&self, task_type: &str) -> Option<BTreeMap<String, f64>> {
        let counts = self.counts.get(task_type)?;
        let total: usize = counts.values().sum();
        Some(
            counts
                .iter()
                .map(|(token, count)| (token.clone(), *count as f64 / total as f64))
                .collect(),
        )
    }

    /// Frequency of `token` within `task_type`; `None` when never seen.
    pub fn frequency(&self, task_type: &str, token: &str) -> Option<f64> {
        let counts = self.counts.get(task_type)?;
        let count = *counts.get(token)?;
        let total: usize = counts.values().sum();
        Some(count as f64 / total as f64)
    }

    /// Total absolute deviation of the tokens' own frequencies from the
    /// anomaly baseline, summed over distinct tokens.
    ///
    /// `None` without a baseline or for an empty sequence.
    pub fn anomaly_score<S: AsRef<str>>(&self, tokens: &[S]) -> Option<f64> {
        if tokens.is_empty() {
            return None;
        }
        let baseline = self.distribution(ANOMALY_BASELINE)?;
        let score: f64 = frequencies(tokens)
            .iter()
            .map(|(token, actual)| {
                let expected = baseline.get(token).copied().unwrap_or(0.0);
                (expected - actual).abs()
            })
            .sum();
        Some(score)
    }

    /// Whether `tokens` deviate from the anomaly baseline by more than
    /// [`ANOMALY_THRESHOLD`]. False when there is nothing to compare.
    pub fn detect_anomaly<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        match self.anomaly_score(tokens) {
            Some(score) => {
                let anomalous = score > ANOMALY_THRESHOLD;
                if anomalous {
                    log::info!("token anomaly detected (score {:.4})", score);
                }
                anomalous
            }
            None => false,
        }
    }

    /// Tokenise `expr` and keep tokens the symbolic baseline has never seen
    /// or sees more often than [`SYMBOLIC_KEEP_FREQUENCY`].
    pub fn simplify_symbolic(&self, expr: &str) -> Vec<String> {
        tokenize_symbolic(expr)
            .into_iter()
            .filter(|token| match self.frequency(SYMBOLIC_BASELINE, token) {
                Some(freq) => freq > SYMBOLIC_KEEP_FREQUENCY,
                None => true,
            })
            .collect()
    }

    /// Remember `strategy` for `game_type` with its outcome.
    pub fn store_strategy(&mut self, game_type: &str, strategy: &str, outcome: f64) {
        let record = StrategyRecord {
            strategy: strategy.to_string(),
            outcome,
            token_distribution: token_distribution(strategy),
        };
        self.strategies
            .entry(game_type.to_string())
            .or_default()
            .push(record);
    }

    /// Every strategy stored for `game_type`, oldest first.
    pub fn strategies(&self, game_type: &str) -> &[StrategyRecord] {
        self.strategies
            .get(game_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The best-scoring strategy for `game_type`. Ties go to the earliest;
    /// NaN outcomes never win.
    pub fn optimal_strategy(&self, game_type: &str) -> Option<&StrategyRecord> {
        let mut best: Option<&StrategyRecord> = None;
        for record in self.strategies(game_type) {
            if record.outcome.is_nan() {
                continue;
            }
            if best.map_or(true, |b| record.outcome > b.outcome) {
                best = Some(record);
            }
        }
        best
    }

    /// Drop every count and strategy.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.strategies.clear();
    }
}
