//! Short-term memory: the single active context of the current turn.
//!
//! There is no history. Each activation replaces the previous context
//! wholesale.

use serde::{Deserialize, Serialize};

/// The context being processed this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermContext {
    /// Numeric state vector.
    pub state: Vec<f64>,
    /// Meaning text used for semantic alignment.
    pub meaning: String,
    /// Optional uncertainty estimate for the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

impl ShortTermContext {
    /// Create a context without an uncertainty estimate.
    pub fn new(state: Vec<f64>, meaning: impl Into<String>) -> Self {
        Self {
            state,
            meaning: meaning.into(),
            uncertainty: None,
        }
    }

    /// Attach an uncertainty estimate.
    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }
}

/// Holder for the active context.
#[derive(Debug, Clone, Default)]
pub struct ShortTermMemory {
    active: Option<ShortTermContext>,
}

impl ShortTermMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active context.
    pub fn activate(&mut self, context: ShortTermContext) {
        self.active = Some(context);
    }

    /// The active context, if any.
    pub fn active(&self) -> Option<&ShortTermContext> {
        self.active.as_ref()
    }

    /// Drop the active context.
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Swap in `context` (or none), returning the previous one.
    pub fn replace(&mut self, context: Option<ShortTermContext>) -> Option<ShortTermContext> {
        std::mem::replace(&mut self.active, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_replaces_wholesale() {
        let mut stm = ShortTermMemory::new();
        assert!(stm.active().is_none());

        stm.activate(ShortTermContext::new(vec![1.0, 2.0], "first").with_uncertainty(0.4));
        stm.activate(ShortTermContext::new(vec![3.0], "second"));

        let active = stm.active().unwrap();
        assert_eq!(active.meaning, "second");
        assert_eq!(active.state, vec![3.0]);
        assert_eq!(active.uncertainty, None);

        stm.reset();
        assert!(stm.active().is_none());
    }

    #[test]
    fn test_uncertainty_is_optional_in_json() {
        let ctx: ShortTermContext =
            serde_json::from_str(r#"{"state":[1.0],"meaning":"why"}"#).unwrap();
        assert_eq!(ctx.uncertainty, None);
    }
}
