//! # cogfusion
//!
//! Adaptive complexity and memory fusion controller.
//!
//! For every input text the controller estimates complexity, squashes two
//! complexity signals through a bounded meta-entropy window, blends the
//! current context with the most relevant long-term experience, and draws a
//! response persona weighted by the complexity level. The resulting
//! [`TurnSignals`] are handed to a caller-supplied [`Responder`].
//!
//! State is session-scoped: one [`Session`] per conversation, or a
//! [`SessionRegistry`] that serialises access per session id.

pub mod complexity;
pub mod config;
pub mod error;
pub mod fusion;
pub mod memory;
pub mod persona;
pub mod session;

// Re-exports for convenience
pub use complexity::{ComplexityAnalyzer, ComplexityMetrics, EntropyLevel};
pub use config::ControllerConfig;
pub use error::{ControllerError, Result};
pub use fusion::FusionWindow;
pub use memory::{
    EmbeddingFunction, FusionOutcome, HashingEmbedder, LtmSqliteStorage, MagnitudeScorer,
    MemoryStore, PerformanceScorer, TokenMemory,
};
pub use persona::{DimensionProfile, PersonaSelection, PersonaSelector};
pub use session::{MemoryIntegration, Responder, Session, SessionRegistry, TurnSignals};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
