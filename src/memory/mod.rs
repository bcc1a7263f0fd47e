//! Hierarchical memory for the cognitive controller.
//!
//! This module provides the short-term context, keyed long-term experiences,
//! the fusion operator that blends them, and SQLite persistence for the
//! long-term store. Embedding and performance scoring are pluggable. Token
//! frequency profiles, anomaly checks and scored strategies live in
//! [`distribution`].

pub mod distribution;
pub mod embedding;
pub mod hierarchical;
pub mod long_term;
pub mod performance;
pub mod short_term;
pub mod storage;
pub mod vector;

pub use distribution::{
    token_distribution, tokenize_symbolic, StrategyRecord, TokenMemory, ANOMALY_BASELINE,
    ANOMALY_THRESHOLD, SYMBOLIC_BASELINE,
};
pub use embedding::{EmbeddingFunction, HashingEmbedder, DEFAULT_HASHING_DIMENSION};
pub use hierarchical::{
    relative_emergence, BlendWeights, EmergenceReport, FusionOutcome, MemoryStore,
    RelevantMemory,
};
pub use long_term::{LongTermMemory, MemoryRecord};
pub use performance::{MagnitudeScorer, PerformanceScorer};
pub use short_term::{ShortTermContext, ShortTermMemory};
pub use storage::LtmSqliteStorage;
