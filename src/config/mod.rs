//! Controller configuration.
//!
//! One [`ControllerConfig`] describes everything a session needs: the role
//! list and per-level selection weights, the fusion window, and the memory
//! blend weights. Configurations are loaded from YAML or JSON and validated
//! before any turn is processed.
//!
//! ```yaml
//! persona:
//!   roles: [Educator, Researcher, Consultant]
//!   role_weights:
//!     low:    [0.6, 0.3, 0.1]
//!     medium: [0.3, 0.4, 0.3]
//!     high:   [0.1, 0.3, 0.6]
//!   dimension_weights:
//!     low:    { Analytical: 0.4, Emotive: 0.6, Structured: 0.7, Exploratory: 0.3 }
//!     medium: { Analytical: 0.5, Emotive: 0.5, Structured: 0.5, Exploratory: 0.5 }
//!     high:   { Analytical: 0.7, Emotive: 0.3, Structured: 0.4, Exploratory: 0.6 }
//! window:
//!   capacity: 10
//!   temperature: 1.0
//! memory:
//!   stm_weight: 0.6
//!   ltm_weight: 0.4
//!   significance: 0.3
//!   emergence_threshold: 0.15
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::complexity::EntropyLevel;
use crate::error::{ControllerError, Result};
use crate::fusion::MAX_WINDOW_CAPACITY;

// ============================================================================
// Per-level values
// ============================================================================

/// One value per complexity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLevel<T> {
    pub low: T,
    pub medium: T,
    pub high: T,
}

impl<T> PerLevel<T> {
    /// Value for `level`.
    pub fn get(&self, level: EntropyLevel) -> &T {
        match level {
            EntropyLevel::Low => &self.low,
            EntropyLevel::Medium => &self.medium,
            EntropyLevel::High => &self.high,
        }
    }

    /// `(level, value)` pairs in ascending level order.
    pub fn iter(&self) -> impl Iterator<Item = (EntropyLevel, &T)> {
        EntropyLevel::ALL.into_iter().map(move |level| (level, self.get(level)))
    }
}

// ============================================================================
// Persona configuration
// ============================================================================

/// Weights for the two binary style draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    #[serde(rename = "Analytical")]
    pub analytical: f64,
    #[serde(rename = "Emotive")]
    pub emotive: f64,
    #[serde(rename = "Structured")]
    pub structured: f64,
    #[serde(rename = "Exploratory")]
    pub exploratory: f64,
}

impl DimensionWeights {
    pub fn new(analytical: f64, emotive: f64, structured: f64, exploratory: f64) -> Self {
        Self {
            analytical,
            emotive,
            structured,
            exploratory,
        }
    }
}

/// Role list plus per-level role and dimension weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Candidate roles, in the order the weight vectors refer to them.
    pub roles: Vec<String>,
    /// Role weights, aligned 1:1 with `roles`.
    pub role_weights: PerLevel<Vec<f64>>,
    /// Style dimension weights.
    pub dimension_weights: PerLevel<DimensionWeights>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            roles: vec![
                "Educator".to_string(),
                "Researcher".to_string(),
                "Consultant".to_string(),
            ],
            role_weights: PerLevel {
                low: vec![0.6, 0.3, 0.1],
                medium: vec![0.3, 0.4, 0.3],
                high: vec![0.1, 0.3, 0.6],
            },
            dimension_weights: PerLevel {
                low: DimensionWeights::new(0.4, 0.6, 0.7, 0.3),
                medium: DimensionWeights::new(0.5, 0.5, 0.5, 0.5),
                high: DimensionWeights::new(0.7, 0.3, 0.4, 0.6),
            },
        }
    }
}

impl PersonaConfig {
    /// Check weight shapes and totals.
    pub fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(ControllerError::config("persona role list is empty"));
        }
        for (level, weights) in self.role_weights.iter() {
            if weights.len() != self.roles.len() {
                return Err(ControllerError::config(format!(
                    "role_weights.{} has {} entries but there are {} roles",
                    level,
                    weights.len(),
                    self.roles.len()
                )));
            }
            check_weight_vector(&format!("role_weights.{}", level), weights)?;
        }
        for (level, dims) in self.dimension_weights.iter() {
            check_weight_vector(
                &format!("dimension_weights.{} (Analytical/Emotive)", level),
                &[dims.analytical, dims.emotive],
            )?;
            check_weight_vector(
                &format!("dimension_weights.{} (Structured/Exploratory)", level),
                &[dims.structured, dims.exploratory],
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Window and memory configuration
// ============================================================================

/// Fusion window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Maximum retained samples `W`.
    pub capacity: usize,
    /// Damping temperature `T`.
    pub temperature: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            temperature: 1.0,
        }
    }
}

/// Memory fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Base weight of the short-term context.
    pub stm_weight: f64,
    /// Base weight of the recalled long-term record.
    pub ltm_weight: f64,
    /// Significance factor `φ` applied to the interaction strength.
    pub significance: f64,
    /// Emergence index above which a fusion is promoted to long-term memory.
    pub emergence_threshold: f64,
    /// Optional cap on long-term records (oldest evicted first).
    pub ltm_capacity: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            stm_weight: 0.6,
            ltm_weight: 0.4,
            significance: 0.3,
            emergence_threshold: 0.15,
            ltm_capacity: None,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<()> {
        check_scalar("memory.stm_weight", self.stm_weight)?;
        check_scalar("memory.ltm_weight", self.ltm_weight)?;
        check_scalar("memory.significance", self.significance)?;
        check_scalar("memory.emergence_threshold", self.emergence_threshold)?;
        if self.stm_weight + self.ltm_weight + self.significance == 0.0 {
            return Err(ControllerError::config(
                "memory.stm_weight, memory.ltm_weight and memory.significance are all zero",
            ));
        }
        if self.ltm_capacity == Some(0) {
            return Err(ControllerError::config("memory.ltm_capacity must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Seed for persona selection; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound on a single responder call.
    #[serde(default = "default_responder_timeout_secs")]
    pub responder_timeout_secs: f64,
}

fn default_responder_timeout_secs() -> f64 {
    60.0
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            persona: PersonaConfig::default(),
            window: WindowConfig::default(),
            memory: MemoryConfig::default(),
            seed: None,
            responder_timeout_secs: default_responder_timeout_secs(),
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        log::debug!("loading controller config from {}", path.display());
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate every numeric field and weight vector.
    pub fn validate(&self) -> Result<()> {
        self.persona.validate()?;
        if self.window.capacity == 0 || self.window.capacity > MAX_WINDOW_CAPACITY {
            return Err(ControllerError::config(format!(
                "window.capacity must be between 1 and {} (got {})",
                MAX_WINDOW_CAPACITY, self.window.capacity
            )));
        }
        check_scalar("window.temperature", self.window.temperature)?;
        self.memory.validate()?;
        if !self.responder_timeout_secs.is_finite() || self.responder_timeout_secs <= 0.0 {
            return Err(ControllerError::config(format!(
                "responder_timeout_secs must be finite and positive (got {})",
                self.responder_timeout_secs
            )));
        }
        Duration::try_from_secs_f64(self.responder_timeout_secs).map_err(|e| {
            ControllerError::config(format!(
                "responder_timeout_secs is not a representable duration (got {}): {}",
                self.responder_timeout_secs, e
            ))
        })?;
        Ok(())
    }

    /// Responder timeout as a [`Duration`].
    ///
    /// Values [`validate`](Self::validate) would reject saturate to
    /// `Duration::MAX` (too large) or `Duration::ZERO` (negative or NaN).
    pub fn responder_timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.responder_timeout_secs) {
            Ok(timeout) => timeout,
            Err(_) if self.responder_timeout_secs > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }
}

fn check_scalar(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ControllerError::config(format!(
            "{} must be finite and non-negative (got {})",
            name, value
        )));
    }
    Ok(())
}

/// Every weight finite and non-negative, with a positive total.
pub(crate) fn check_weight_vector(name: &str, weights: &[f64]) -> Result<()> {
    for (i, w) in weights.iter().enumerate() {
        check_scalar(&format!("{}[{}]", name, i), *w)?;
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(ControllerError::config(format!("{} weights sum to zero", name)));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_YAML: &str = r#"
persona:
  roles: [Tutor, Analyst]
  role_weights:
    low: [1.0, 0.0]
    medium: [0.5, 0.5]
    high: [0.0, 1.0]
  dimension_weights:
    low: { Analytical: 1.0, Emotive: 0.0, Structured: 1.0, Exploratory: 0.0 }
    medium: { Analytical: 0.5, Emotive: 0.5, Structured: 0.5, Exploratory: 0.5 }
    high: { Analytical: 0.0, Emotive: 1.0, Structured: 0.0, Exploratory: 1.0 }
window:
  capacity: 4
memory:
  significance: 0.5
  ltm_capacity: 32
seed: 7
"#;

    #[test]
    fn test_default_config_is_valid() {
        ControllerConfig::default().validate().unwrap();
    }

    #[test]
    fn test_yaml_roundtrip_with_partial_sections() {
        let config = ControllerConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        assert_eq!(config.persona.roles, vec!["Tutor", "Analyst"]);
        assert_eq!(config.window.capacity, 4);
        assert_eq!(config.window.temperature, 1.0);
        assert_eq!(config.memory.significance, 0.5);
        assert_eq!(config.memory.stm_weight, 0.6);
        assert_eq!(config.memory.ltm_capacity, Some(32));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.persona.dimension_weights.high.emotive, 1.0);

        let yaml = config.to_yaml_string().unwrap();
        let again = ControllerConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_role_weight_length_mismatch_rejected() {
        let mut config = ControllerConfig::default();
        config.persona.role_weights.medium = vec![0.5, 0.5];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)));
        assert!(err.to_string().contains("role_weights.medium"));
    }

    #[test]
    fn test_zero_total_weights_rejected() {
        let mut config = ControllerConfig::default();
        config.persona.role_weights.high = vec![0.0, 0.0, 0.0];
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));

        let mut config = ControllerConfig::default();
        config.persona.dimension_weights.low.structured = 0.0;
        config.persona.dimension_weights.low.exploratory = 0.0;
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));
    }

    #[test]
    fn test_negative_and_non_finite_rejected() {
        let mut config = ControllerConfig::default();
        config.memory.stm_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.window.temperature = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.persona.role_weights.low[1] = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.window.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_window_capacity_rejected() {
        let mut config = ControllerConfig::default();
        config.window.capacity = usize::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)));
        assert!(err.to_string().contains("window.capacity"));

        config.window.capacity = MAX_WINDOW_CAPACITY;
        config.validate().unwrap();
    }

    #[test]
    fn test_unrepresentable_timeout_rejected() {
        let mut config = ControllerConfig::default();
        config.responder_timeout_secs = 1e30;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)));
        assert!(err.to_string().contains("responder_timeout_secs"));
        assert_eq!(config.responder_timeout(), Duration::MAX);

        config.responder_timeout_secs = -1.0;
        assert_eq!(config.responder_timeout(), Duration::ZERO);

        config.responder_timeout_secs = 2.5;
        config.validate().unwrap();
        assert_eq!(config.responder_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_yaml_fails_validation_on_load() {
        let yaml = SAMPLE_YAML.replace("low: [1.0, 0.0]", "low: [1.0]");
        let err = ControllerConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)));
    }

    #[test]
    fn test_from_path_yaml_and_json() {
        let mut yaml_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        yaml_file.write_all(SAMPLE_YAML.as_bytes()).unwrap();
        let from_yaml = ControllerConfig::from_path(yaml_file.path()).unwrap();

        let json = serde_json::to_string(&from_yaml).unwrap();
        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json_file.write_all(json.as_bytes()).unwrap();
        let from_json = ControllerConfig::from_path(json_file.path()).unwrap();

        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ControllerConfig::from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ControllerError::Io(_)));
    }
}
