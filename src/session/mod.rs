//! Per-conversation orchestration.
//!
//! A [`Session`] owns everything one conversation mutates: its fusion window,
//! its memory store and its random source. Nothing here is shared between
//! sessions; the [`SessionRegistry`] hands out one exclusive lock per
//! session id for callers serving many conversations at once.
//!
//! ```text
//! text ─→ ComplexityAnalyzer ─→ FusionWindow.fuse(depth, abstraction)
//!   │                                      │
//!   └─→ ContextBuilder ─→ MemoryStore.fuse ─→ emergence_index
//!                                          │
//!        PersonaSelector.select(level) ←───┘
//!                    ↓
//!               TurnSignals ─→ Responder ─→ apply_constraints ─→ store_experience
//! ```

pub mod context;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::complexity::{ComplexityAnalyzer, ComplexityMetrics};
use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};
use crate::fusion::FusionWindow;
use crate::memory::vector::{cosine_similarity, ensure_same_dimension};
use crate::memory::{
    EmbeddingFunction, EmergenceReport, FusionOutcome, MemoryStore, PerformanceScorer,
};
use crate::persona::{DimensionProfile, PersonaSelection, PersonaSelector};

pub use context::{ContextBuilder, CONTEXT_STATE_DIMENSION};

// ============================================================================
// Turn signals
// ============================================================================

/// Result of trying to integrate long-term memory into a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MemoryIntegration {
    /// Fusion succeeded.
    Fused {
        outcome: FusionOutcome,
        emergence: EmergenceReport,
    },
    /// No usable memory this turn; the turn proceeds without it.
    Unavailable { reason: String },
}

impl MemoryIntegration {
    pub fn is_fused(&self) -> bool {
        matches!(self, Self::Fused { .. })
    }
}

/// Everything the controller decided about one input, handed to the responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSignals {
    pub metrics: ComplexityMetrics,
    /// Squashed fusion of cognitive depth and abstraction, in [−1, 1].
    pub fused_signal: f64,
    pub meta_entropy: f64,
    pub dynamic_threshold: f64,
    /// Whether `fused_signal` exceeded `dynamic_threshold`.
    pub significant: bool,
    pub memory: MemoryIntegration,
    pub persona: PersonaSelection,
}

impl TurnSignals {
    pub fn dimensions(&self) -> &DimensionProfile {
        &self.persona.dimensions
    }
}

/// Produces the response text for a turn.
///
/// Prompt wording is entirely the implementor's concern.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, input: &str, signals: &TurnSignals) -> anyhow::Result<String>;
}

/// A completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub signals: TurnSignals,
    /// Responder output with dimension constraints applied.
    pub response: String,
    /// Score assigned to the response.
    pub performance: f64,
    /// Key under which the turn was stored in long-term memory.
    pub stored_key: String,
}

// ============================================================================
// Session
// ============================================================================

/// One conversation's controller state.
pub struct Session {
    id: String,
    config: ControllerConfig,
    window: FusionWindow,
    memory: MemoryStore,
    selector: PersonaSelector,
    rng: StdRng,
    embedder: Arc<dyn EmbeddingFunction>,
    context_builder: ContextBuilder,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("window", &self.window)
            .field("memory", &self.memory)
            .finish()
    }
}

impl Session {
    /// Create a session. The configuration is validated first.
    pub fn new(
        id: impl Into<String>,
        config: ControllerConfig,
        embedder: Arc<dyn EmbeddingFunction>,
        scorer: Arc<dyn PerformanceScorer>,
    ) -> Result<Self> {
        config.validate()?;
        let window = FusionWindow::from_config(&config.window)?;
        let memory = MemoryStore::new(config.memory, embedder.clone(), scorer)?;
        let selector = PersonaSelector::new(config.persona.clone())?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let id = id.into();
        log::info!("created session {}", id);

        Ok(Self {
            id,
            config,
            window,
            memory,
            selector,
            rng,
            embedder,
            context_builder: ContextBuilder::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn window(&self) -> &FusionWindow {
        &self.window
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// Run every controller stage on `text` without calling a responder.
    ///
    /// `NoMemory` and `DegenerateFusion` become
    /// [`MemoryIntegration::Unavailable`]; other failures propagate and leave
    /// the window, the short-term context and the random source untouched.
    pub fn analyze(&mut self, text: &str) -> Result<TurnSignals> {
        let metrics = ComplexityAnalyzer::analyze(text);

        let mut window = self.window.clone();
        let fused_signal = window.fuse(metrics.cognitive_depth, metrics.abstraction_level);
        let meta_entropy = window.meta_entropy();
        let dynamic_threshold = window.dynamic_threshold();
        let significant = fused_signal > dynamic_threshold;

        let mut rng = self.rng.clone();
        let persona = self.selector.select(metrics.level, &mut rng)?;

        let previous = self.memory.short_term().cloned();
        self.memory.activate_context(self.context_builder.build(text));
        let memory = match self.integrate_memory() {
            Ok(memory) => memory,
            Err(e) => {
                log::error!("session {}: memory fusion failed: {}", self.id, e);
                self.memory.restore_context(previous);
                return Err(e);
            }
        };

        self.window = window;
        self.rng = rng;
        log::debug!(
            "session {}: level={} fused={:.4} role={} dims={}",
            self.id,
            metrics.level,
            fused_signal,
            persona.role,
            persona.dimensions
        );

        Ok(TurnSignals {
            metrics,
            fused_signal,
            meta_entropy,
            dynamic_threshold,
            significant,
            memory,
            persona,
        })
    }

    fn integrate_memory(&mut self) -> Result<MemoryIntegration> {
        match self.memory.fuse() {
            Ok(outcome) => {
                let emergence = self.memory.emergence_index(&outcome)?;
                Ok(MemoryIntegration::Fused { outcome, emergence })
            }
            Err(e) if e.is_no_memory() => {
                log::warn!("session {}: continuing without memory ({})", self.id, e);
                Ok(MemoryIntegration::Unavailable {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Score a response: character count times its non-negative semantic
    /// similarity to the input.
    pub fn evaluate_response(&self, input: &str, response: &str) -> Result<f64> {
        let input_vec = self
            .embedder
            .embed_query(input)
            .map_err(ControllerError::Embedding)?;
        let response_vec = self
            .embedder
            .embed_query(response)
            .map_err(ControllerError::Embedding)?;
        ensure_same_dimension(&input_vec, &response_vec)?;
        let similarity = cosine_similarity(&input_vec, &response_vec).max(0.0);
        Ok(response.chars().count() as f64 * similarity)
    }

    /// Analyse `text`, ask `responder` for an answer within the configured
    /// timeout, constrain it, score it and store the turn as an experience.
    ///
    /// A failed or timed-out responder leaves long-term memory as the
    /// analysis stage left it.
    pub async fn run_turn(&mut self, text: &str, responder: &dyn Responder) -> Result<TurnOutcome> {
        let signals = self.analyze(text)?;

        let timeout = self.config.responder_timeout();
        let raw = match tokio::time::timeout(timeout, responder.respond(text, &signals)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                log::error!("session {}: responder failed: {}", self.id, e);
                return Err(ControllerError::Responder(e));
            }
            Err(_) => {
                log::error!(
                    "session {}: responder timed out after {:?}",
                    self.id,
                    timeout
                );
                return Err(ControllerError::Timeout(timeout));
            }
        };

        let response = signals.dimensions().apply_constraints(&raw);
        let performance = self.evaluate_response(text, &response)?;

        let context = self.context_builder.build(text);
        let stored_key = self.memory.fresh_key();
        self.memory
            .store_experience(stored_key.clone(), context.state, context.meaning, performance);

        Ok(TurnOutcome {
            signals,
            response,
            performance,
            stored_key,
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Sessions keyed by id, each behind its own async lock.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    config: ControllerConfig,
    embedder: Arc<dyn EmbeddingFunction>,
    scorer: Arc<dyn PerformanceScorer>,
}

impl SessionRegistry {
    /// Create an empty registry. The configuration is validated once here.
    pub fn new(
        config: ControllerConfig,
        embedder: Arc<dyn EmbeddingFunction>,
        scorer: Arc<dyn PerformanceScorer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: DashMap::new(),
            config,
            embedder,
            scorer,
        })
    }

    /// The session for `id`, created on first use.
    pub fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        if let Some(existing) = self.sessions.get(id) {
            return Ok(existing.value().clone());
        }
        let created = Session::new(
            id,
            self.config.clone(),
            self.embedder.clone(),
            self.scorer.clone(),
        )?;
        let entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(created)));
        Ok(entry.value().clone())
    }

    /// Drop the session for `id`.
    pub fn remove(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HashingEmbedder, MagnitudeScorer};
    use crate::persona::CognitiveStyle;
    use std::time::Duration;

    fn seeded_config() -> ControllerConfig {
        ControllerConfig {
            seed: Some(42),
            responder_timeout_secs: 1.0,
            ..ControllerConfig::default()
        }
    }

    fn session() -> Session {
        Session::new(
            "test",
            seeded_config(),
            Arc::new(HashingEmbedder::default()),
            Arc::new(MagnitudeScorer),
        )
        .unwrap()
    }

    /// Echoes the input, prefixed with a phrase the constraints rewrite.
    struct EchoResponder;

    #[async_trait]
    impl Responder for EchoResponder {
        async fn respond(&self, input: &str, signals: &TurnSignals) -> anyhow::Result<String> {
            let prefix = match signals.dimensions().cognitive {
                CognitiveStyle::Analytical => "I feel",
                CognitiveStyle::Emotive => "data shows",
            };
            Ok(format!("{} {}", prefix, input))
        }
    }

    struct FailingResponder;

    #[async_trait]
    impl Responder for FailingResponder {
        async fn respond(&self, _input: &str, _signals: &TurnSignals) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("model offline"))
        }
    }

    struct SlowResponder;

    #[async_trait]
    impl Responder for SlowResponder {
        async fn respond(&self, _input: &str, _signals: &TurnSignals) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_first_analysis_has_no_memory() {
        let mut session = session();
        let signals = session.analyze("Why is the sky blue?").unwrap();
        assert!(!signals.memory.is_fused());
        assert!((-1.0..=1.0).contains(&signals.fused_signal));
        assert_eq!(session.window().len(), 1);
        assert_eq!(signals.meta_entropy, 0.0);
        assert_eq!(signals.dynamic_threshold, 0.5);
    }

    #[test]
    fn test_analysis_fuses_with_stored_experience() {
        let mut session = session();
        session
            .memory_mut()
            .store_experience("seed", vec![20.0, 1.0, 5.0], "why", 50.0);
        let signals = session.analyze("Why is the sky blue?").unwrap();
        match &signals.memory {
            MemoryIntegration::Fused { outcome, .. } => {
                assert_eq!(outcome.source_key, "seed");
                assert!((outcome.weights.total() - 1.0).abs() < 1e-6);
            }
            other => panic!("expected fusion, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_stored_state_propagates() {
        let mut session = session();
        session
            .memory_mut()
            .store_experience("bad", vec![1.0, 2.0], "why", 1.0);
        let err = session.analyze("why").unwrap_err();
        assert!(matches!(err, ControllerError::ShapeMismatch { .. }));
        assert_eq!(session.memory().long_term().len(), 1);
        assert_eq!(session.window().len(), 0);
        assert!(session.memory().short_term().is_none());
    }

    #[test]
    fn test_failed_analysis_keeps_earlier_turn_state() {
        let mut twin = session();
        let mut session = session();
        session.analyze("how does it work?").unwrap();
        twin.analyze("how does it work?").unwrap();
        let window_before = session.window().samples();
        let context_before = session.memory().short_term().cloned();

        session
            .memory_mut()
            .store_experience("bad", vec![1.0, 2.0], "why", 1.0);
        assert!(session.analyze("why does it fail?").is_err());
        assert_eq!(session.window().samples(), window_before);
        assert_eq!(session.memory().short_term().cloned(), context_before);

        // The failed turn consumed no randomness either.
        session.memory_mut().forget("bad");
        assert_eq!(
            session.analyze("compare the strategies").unwrap().persona,
            twin.analyze("compare the strategies").unwrap().persona
        );
    }

    #[test]
    fn test_oversized_window_rejected_at_construction() {
        let mut config = seeded_config();
        config.window.capacity = usize::MAX;
        let result = Session::new(
            "big",
            config,
            Arc::new(HashingEmbedder::default()),
            Arc::new(MagnitudeScorer),
        );
        assert!(matches!(result, Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_same_seed_same_personas() {
        let mut a = session();
        let mut b = session();
        for text in ["hello", "how does it work?", "compare the strategies"] {
            assert_eq!(
                a.analyze(text).unwrap().persona,
                b.analyze(text).unwrap().persona
            );
        }
    }

    #[tokio::test]
    async fn test_run_turn_constrains_and_stores() {
        let mut session = session();
        let outcome = session
            .run_turn("how does solar energy work", &EchoResponder)
            .await
            .unwrap();
        assert!(!outcome.response.contains("I feel"));
        assert!(!outcome.response.contains("data shows"));
        assert!(outcome.performance > 0.0);
        assert!(outcome.stored_key.starts_with("exp_"));
        let stored = session
            .memory()
            .long_term()
            .get(&outcome.stored_key)
            .unwrap();
        assert_eq!(stored.meaning, "how");
        assert_eq!(stored.state.len(), CONTEXT_STATE_DIMENSION);

        // The second turn can now draw on the first.
        let second = session
            .run_turn("how do batteries store it", &EchoResponder)
            .await
            .unwrap();
        assert!(second.signals.memory.is_fused());
    }

    #[tokio::test]
    async fn test_responder_failure_stores_nothing() {
        let mut session = session();
        let err = session.run_turn("why", &FailingResponder).await.unwrap_err();
        assert!(matches!(err, ControllerError::Responder(_)));
        assert!(session.memory().long_term().is_empty());
    }

    #[tokio::test]
    async fn test_responder_timeout() {
        let mut session = session();
        let err = session.run_turn("why", &SlowResponder).await.unwrap_err();
        assert!(matches!(err, ControllerError::Timeout(d) if d == Duration::from_secs(1)));
        assert!(session.memory().long_term().is_empty());
    }

    #[test]
    fn test_evaluate_response() {
        let session = session();
        assert_eq!(session.evaluate_response("solar energy", "").unwrap(), 0.0);
        let same = session
            .evaluate_response("solar energy", "solar energy")
            .unwrap();
        assert!((same - 12.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_registry_hands_out_one_session_per_id() {
        let registry = SessionRegistry::new(
            seeded_config(),
            Arc::new(HashingEmbedder::default()),
            Arc::new(MagnitudeScorer),
        )
        .unwrap();
        let a = registry.session("alice").unwrap();
        let a_again = registry.session("alice").unwrap();
        let b = registry.session("bob").unwrap();
        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        a.lock().await.analyze("why").unwrap();
        assert_eq!(a_again.lock().await.window().len(), 1);
        assert_eq!(b.lock().await.window().len(), 0);

        assert!(registry.remove("alice").is_some());
        assert!(!registry.contains("alice"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_rejects_invalid_config() {
        let mut config = ControllerConfig::default();
        config.window.capacity = 0;
        let result = SessionRegistry::new(
            config,
            Arc::new(HashingEmbedder::default()),
            Arc::new(MagnitudeScorer),
        );
        assert!(matches!(result, Err(ControllerError::Config(_))));
    }
}
