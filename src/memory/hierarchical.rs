//! Hierarchical memory store: short-term context fused with the most relevant
//! long-term experience.
//!
//! ```text
//! short-term (state, meaning) ──┐
//!                               ├─ alignment  = cos(embed(meaning_s), embed(meaning_l))
//! long-term best match ─────────┤  interaction = cos(state_s, state_l)
//!                               ↓
//!   w = normalise[stm_w·alignment, ltm_w·alignment, φ·interaction]
//!   fused_state   = w_s·state_s + w_l·state_l + w_e·(state_s ⊙ state_l)/(|s|·|l|)
//!   fused_meaning = sorted unique tokens of both meanings
//!                               ↓
//!   emergence = (perf(fused) − max(perf(s), perf(l))) / max(perf(s), perf(l))
//!   emergence > threshold  ⇒  fused result stored as a new long-term record
//! ```
//!
//! Fusion itself never mutates the store; only a successful emergence
//! evaluation may add a record.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;
use crate::error::{ControllerError, Result};
use crate::memory::distribution::TokenMemory;
use crate::memory::embedding::EmbeddingFunction;
use crate::memory::long_term::{LongTermMemory, MemoryRecord};
use crate::memory::performance::PerformanceScorer;
use crate::memory::short_term::{ShortTermContext, ShortTermMemory};
use crate::memory::storage::LtmSqliteStorage;
use crate::memory::vector::{cosine_similarity, ensure_same_dimension, interaction_term};

// ============================================================================
// Fusion result types
// ============================================================================

/// Normalised blend weights of a fusion. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub stm: f64,
    pub ltm: f64,
    pub emergence: f64,
}

impl BlendWeights {
    pub fn total(&self) -> f64 {
        self.stm + self.ltm + self.emergence
    }
}

/// Most relevant long-term record for the active context.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevantMemory {
    pub key: String,
    pub record: MemoryRecord,
    /// Semantic alignment score in [−1, 1].
    pub alignment: f64,
}

/// Output of one fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    pub fused_state: Vec<f64>,
    pub fused_meaning: String,
    pub weights: BlendWeights,
    /// Key of the long-term record that took part.
    pub source_key: String,
    /// Semantic alignment with the source record.
    pub alignment: f64,
    /// State-vector cosine similarity with the source record.
    pub interaction_strength: f64,
}

/// Result of scoring a fusion against its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergenceReport {
    pub index: f64,
    pub stm_performance: f64,
    pub ltm_performance: f64,
    pub fused_performance: f64,
    /// Key of the long-term record created from the fusion, if promoted.
    pub stored_key: Option<String>,
}

impl EmergenceReport {
    pub fn promoted(&self) -> bool {
        self.stored_key.is_some()
    }
}

/// Relative improvement of `fused` over the better of `stm` and `ltm`.
///
/// A zero baseline makes the ratio undefined; it is reported as 0.
pub fn relative_emergence(stm: f64, ltm: f64, fused: f64) -> f64 {
    let best = stm.max(ltm);
    if best == 0.0 {
        log::warn!("emergence baseline is zero; reporting index 0");
        return 0.0;
    }
    (fused - best) / best
}

// ============================================================================
// Memory store
// ============================================================================

/// Short-term context plus keyed long-term experiences.
///
/// One store belongs to one session. It is not internally synchronised.
pub struct MemoryStore {
    short_term: ShortTermMemory,
    long_term: LongTermMemory,
    tokens: TokenMemory,
    config: MemoryConfig,
    embedder: Arc<dyn EmbeddingFunction>,
    scorer: Arc<dyn PerformanceScorer>,
    sequence: u64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("short_term", &self.short_term)
            .field("long_term_len", &self.long_term.len())
            .field("token_tasks", &self.tokens.task_types())
            .field("config", &self.config)
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store.
    ///
    /// Fails with `Config` when the memory configuration is invalid.
    pub fn new(
        config: MemoryConfig,
        embedder: Arc<dyn EmbeddingFunction>,
        scorer: Arc<dyn PerformanceScorer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            short_term: ShortTermMemory::new(),
            long_term: LongTermMemory::with_capacity(config.ltm_capacity),
            tokens: TokenMemory::new(),
            config,
            embedder,
            scorer,
            sequence: 0,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The active short-term context.
    pub fn short_term(&self) -> Option<&ShortTermContext> {
        self.short_term.active()
    }

    /// The long-term store.
    pub fn long_term(&self) -> &LongTermMemory {
        &self.long_term
    }

    /// Token-frequency profiles and remembered strategies.
    pub fn token_memory(&self) -> &TokenMemory {
        &self.tokens
    }

    pub fn token_memory_mut(&mut self) -> &mut TokenMemory {
        &mut self.tokens
    }

    /// Replace the short-term context.
    pub fn activate_context(&mut self, context: ShortTermContext) {
        log::debug!(
            "activating short-term context (dim={}, meaning={:?})",
            context.state.len(),
            context.meaning
        );
        self.short_term.activate(context);
    }

    /// Put back a previously active context (or none), returning the current one.
    pub fn restore_context(&mut self, context: Option<ShortTermContext>) -> Option<ShortTermContext> {
        self.short_term.replace(context)
    }

    /// Insert or overwrite a long-term record.
    ///
    /// Returns the key evicted by the capacity policy, if any.
    pub fn store_experience(
        &mut self,
        key: impl Into<String>,
        state: Vec<f64>,
        meaning: impl Into<String>,
        performance: f64,
    ) -> Option<String> {
        let key = key.into();
        log::debug!("storing experience {} (performance={:.4})", key, performance);
        self.long_term
            .insert(key, MemoryRecord::new(state, meaning, performance))
    }

    /// Remove a long-term record.
    pub fn forget(&mut self, key: &str) -> Option<MemoryRecord> {
        self.long_term.remove(key)
    }

    /// Remove long-term records scoring below `threshold`.
    pub fn prune_below(&mut self, threshold: f64) -> usize {
        let removed = self.long_term.prune_below(threshold);
        if removed > 0 {
            log::info!("pruned {} long-term records below {}", removed, threshold);
        }
        removed
    }

    /// Remove every long-term record.
    pub fn clear_long_term(&mut self) {
        self.long_term.reset();
    }

    /// A key no other record uses, derived from the wall clock and a counter.
    pub fn fresh_key(&mut self) -> String {
        loop {
            self.sequence += 1;
            let key = format!("exp_{}_{}", Utc::now().timestamp_micros(), self.sequence);
            if !self.long_term.contains(&key) {
                return key;
            }
        }
    }

    fn active_context(&self) -> Result<&ShortTermContext> {
        self.short_term
            .active()
            .ok_or_else(|| ControllerError::NoMemory("no active short-term context".into()))
    }

    fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.embedder
            .embed_query(text)
            .map_err(ControllerError::Embedding)
    }

    /// Long-term record whose meaning best aligns with the active context.
    ///
    /// Ties go to the earliest inserted record.
    pub fn find_most_relevant(&self) -> Result<RelevantMemory> {
        if self.long_term.is_empty() {
            return Err(ControllerError::NoMemory("long-term memory is empty".into()));
        }
        let context = self.active_context()?;
        let query = self.embed(&context.meaning)?;

        let mut best: Option<(&str, &MemoryRecord, f64)> = None;
        for (key, record) in self.long_term.iter() {
            let candidate = self.embed(&record.meaning)?;
            ensure_same_dimension(&query, &candidate)?;
            let score = cosine_similarity(&query, &candidate);
            let better = match best {
                Some((_, _, top)) => score > top,
                None => true,
            };
            if better {
                best = Some((key, record, score));
            }
        }

        let (key, record, alignment) = best
            .ok_or_else(|| ControllerError::NoMemory("long-term memory is empty".into()))?;
        log::debug!("most relevant memory: {} (alignment={:.4})", key, alignment);
        Ok(RelevantMemory {
            key: key.to_string(),
            record: record.clone(),
            alignment,
        })
    }

    /// Blend the active context with its most relevant long-term record.
    ///
    /// Never mutates the store.
    pub fn fuse(&self) -> Result<FusionOutcome> {
        let context = self.active_context()?;
        let relevant = self.find_most_relevant()?;
        let record = &relevant.record;
        ensure_same_dimension(&context.state, &record.state)?;

        let alignment = relevant.alignment;
        let interaction_strength = cosine_similarity(&context.state, &record.state);

        let stm_raw = (self.config.stm_weight * alignment).max(0.0);
        let ltm_raw = (self.config.ltm_weight * alignment).max(0.0);
        let emergence_raw = (self.config.significance * interaction_strength).max(0.0);
        let total = stm_raw + ltm_raw + emergence_raw;
        if total <= 0.0 || !total.is_finite() {
            log::debug!(
                "degenerate fusion with {} (alignment={:.4}, interaction={:.4})",
                relevant.key,
                alignment,
                interaction_strength
            );
            return Err(ControllerError::DegenerateFusion);
        }
        let weights = BlendWeights {
            stm: stm_raw / total,
            ltm: ltm_raw / total,
            emergence: emergence_raw / total,
        };

        let interaction = interaction_term(&context.state, &record.state);
        let fused_state: Vec<f64> = context
            .state
            .iter()
            .zip(record.state.iter())
            .zip(interaction.iter())
            .map(|((s, l), i)| weights.stm * s + weights.ltm * l + weights.emergence * i)
            .collect();

        let fused_meaning = context
            .meaning
            .split_whitespace()
            .chain(record.meaning.split_whitespace())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(" ");

        log::debug!(
            "fused with {}: weights stm={:.3} ltm={:.3} emergence={:.3}",
            relevant.key,
            weights.stm,
            weights.ltm,
            weights.emergence
        );

        Ok(FusionOutcome {
            fused_state,
            fused_meaning,
            weights,
            source_key: relevant.key,
            alignment,
            interaction_strength,
        })
    }

    /// Score a fusion and promote it to long-term memory when it shows
    /// emergence above the configured threshold.
    pub fn emergence_index(&mut self, outcome: &FusionOutcome) -> Result<EmergenceReport> {
        let context = self.active_context()?;
        let record = self.long_term.get(&outcome.source_key).ok_or_else(|| {
            ControllerError::NoMemory(format!(
                "source record {} is no longer in long-term memory",
                outcome.source_key
            ))
        })?;

        let stm_performance = self.scorer.score(&context.state);
        let ltm_performance = self.scorer.score(&record.state);
        let fused_performance = self.scorer.score(&outcome.fused_state);
        let index = relative_emergence(stm_performance, ltm_performance, fused_performance);

        let stored_key = if index > self.config.emergence_threshold {
            let key = self.fresh_key();
            log::info!(
                "emergence {:.4} above {:.4}; storing fused experience {}",
                index,
                self.config.emergence_threshold,
                key
            );
            self.long_term.insert(
                key.clone(),
                MemoryRecord::new(
                    outcome.fused_state.clone(),
                    outcome.fused_meaning.clone(),
                    fused_performance,
                ),
            );
            Some(key)
        } else {
            None
        };

        Ok(EmergenceReport {
            index,
            stm_performance,
            ltm_performance,
            fused_performance,
            stored_key,
        })
    }

    /// Write every long-term record to `storage` in a single transaction.
    pub fn persist_to(&self, storage: &LtmSqliteStorage) -> Result<usize> {
        let written = storage
            .save_all(self.long_term.iter())
            .map_err(ControllerError::Storage)?;
        log::info!("persisted {} long-term records", written);
        Ok(written)
    }

    /// Load every record from `storage` into long-term memory.
    pub fn restore_from(&mut self, storage: &LtmSqliteStorage) -> Result<usize> {
        let records = storage.load_all().map_err(ControllerError::Storage)?;
        let count = records.len();
        for (key, record) in records {
            self.long_term.insert(key, record);
        }
        log::info!("restored {} long-term records", count);
        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
