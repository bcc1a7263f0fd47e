//! Weighted persona selection by complexity level.
//!
//! The selector owns nothing but its configuration. Randomness is supplied by
//! the caller so sessions can seed it and tests can replay it.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::complexity::EntropyLevel;
use crate::config::PersonaConfig;
use crate::error::{ControllerError, Result};
use crate::persona::dimension::{CognitiveStyle, DimensionProfile, ProcessingStyle};

/// Role and style dimensions drawn for one turn.
///
/// Serialises flat: `{"role", "cognitive_style", "processing_style"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSelection {
    pub role: String,
    #[serde(flatten)]
    pub dimensions: DimensionProfile,
}

/// Draws roles and style dimensions from per-level weights.
#[derive(Debug, Clone)]
pub struct PersonaSelector {
    config: PersonaConfig,
}

impl PersonaSelector {
    /// Create a selector. Fails with `Config` on invalid weights.
    pub fn new(config: PersonaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    /// Candidate roles.
    pub fn roles(&self) -> &[String] {
        &self.config.roles
    }

    /// Weighted draw over the role list using `level`'s weights.
    pub fn select_role<R: Rng + ?Sized>(&self, level: EntropyLevel, rng: &mut R) -> Result<String> {
        let weights = self.config.role_weights.get(level);
        if weights.len() != self.config.roles.len() {
            return Err(ControllerError::config(format!(
                "role_weights.{} has {} entries but there are {} roles",
                level,
                weights.len(),
                self.config.roles.len()
            )));
        }
        let index = draw(&format!("role_weights.{}", level), weights, rng)?;
        let role = self.config.roles[index].clone();
        log::debug!("selected role {} for {} complexity", role, level);
        Ok(role)
    }

    /// Two independent binary draws: Analytical vs Emotive, then
    /// Structured vs Exploratory.
    pub fn select_dimensions<R: Rng + ?Sized>(
        &self,
        level: EntropyLevel,
        rng: &mut R,
    ) -> Result<DimensionProfile> {
        let weights = self.config.dimension_weights.get(level);
        let cognitive = draw(
            &format!("dimension_weights.{} (Analytical/Emotive)", level),
            &[weights.analytical, weights.emotive],
            rng,
        )?;
        let processing = draw(
            &format!("dimension_weights.{} (Structured/Exploratory)", level),
            &[weights.structured, weights.exploratory],
            rng,
        )?;
        Ok(DimensionProfile::new(
            CognitiveStyle::ALL[cognitive],
            ProcessingStyle::ALL[processing],
        ))
    }

    /// Role and dimensions in one call.
    pub fn select<R: Rng + ?Sized>(&self, level: EntropyLevel, rng: &mut R) -> Result<PersonaSelection> {
        let role = self.select_role(level, rng)?;
        let dimensions = self.select_dimensions(level, rng)?;
        Ok(PersonaSelection { role, dimensions })
    }
}

fn draw<R: Rng + ?Sized>(name: &str, weights: &[f64], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::new(weights)
        .map_err(|e| ControllerError::config(format!("{}: {}", name, e)))?;
    Ok(dist.sample(rng))
}
