//! Engine configuration.

use crate::constants::{DEFAULT_MAX_WEIGHT, MIN_WEIGHT};
use crate::error::ReputationError;

/// Tunables of the reputation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReputationConfig {
    /// Upper bound of a single rater's influence weight.
    pub max_weight: f64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self { max_weight: DEFAULT_MAX_WEIGHT }
    }
}

impl ReputationConfig {
    /// Build a configuration with a custom weight cap.
    pub fn with_max_weight(max_weight: f64) -> Result<Self, ReputationError> {
        let cfg = Self { max_weight };
        cfg.validate()?;
        Ok(cfg)
    }

    /// The weight cap must be finite and no lower than the weight floor.
    pub fn validate(&self) -> Result<(), ReputationError> {
        if !self.max_weight.is_finite() || self.max_weight < MIN_WEIGHT {
            return Err(ReputationError::Config(format!(
                "max_weight must be a finite number >= {MIN_WEIGHT}, got {}",
                self.max_weight
            )));
        }
        Ok(())
    }
}
