//! Persona system: role and style selection driven by input complexity.
//!
//! # Architecture
//!
//! ```text
//! EntropyLevel (low / medium / high)
//!   ↓  per-level role weights
//! role ∈ configured role list
//!   ↓  per-level dimension weights
//! DimensionProfile { Analytical | Emotive, Structured | Exploratory }
//!   ↓  after the responder answers
//! apply_constraints(response)
//! ```

pub mod dimension;
pub mod selector;

// Re-exports
pub use dimension::{CognitiveStyle, DimensionProfile, ProcessingStyle};
pub use selector::{PersonaSelection, PersonaSelector};
