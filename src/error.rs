//! Controller error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the complexity/memory fusion controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Malformed configuration (zero weight vectors, mismatched lengths,
    /// non-finite or negative numbers). Fatal, raised before any turn runs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fusion was requested without a short-term context or with an empty
    /// long-term store. Callers fall back to the no-memory path.
    #[error("No memory available: {0}")]
    NoMemory(String),

    /// Two vectors that must share a dimensionality did not.
    #[error("Shape mismatch: expected dimension {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Every fusion blend weight came out as zero.
    #[error("Degenerate fusion: all blend weights are zero")]
    DegenerateFusion,

    /// The embedding capability failed.
    #[error("Embedding error: {0}")]
    Embedding(anyhow::Error),

    /// The external responder failed.
    #[error("Responder error: {0}")]
    Responder(anyhow::Error),

    /// The external responder did not answer in time.
    #[error("Responder timed out after {0:?}")]
    Timeout(Duration),

    /// Long-term persistence failed.
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ControllerError {
    /// Whether the caller should take the no-memory-integration path.
    ///
    /// `DegenerateFusion` counts as no memory.
    pub fn is_no_memory(&self) -> bool {
        matches!(self, Self::NoMemory(_) | Self::DegenerateFusion)
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ControllerError> = std::result::Result<T, E>;
