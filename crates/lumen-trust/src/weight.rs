//! Rater influence weights.
//!
//! `weight(p, c) = clamp(log10(p + 1) * sqrt(c + 1), MIN_WEIGHT, max_weight)`
//!
//! Wealth enters log-scaled and confirmed connections square-root-scaled, so
//! neither alone lets a rater dominate. Every rater counts at least
//! [`MIN_WEIGHT`]; none counts more than the configured cap.

use lumen_core::config::ReputationConfig;
use lumen_core::constants::MIN_WEIGHT;

/// Pure weight computation bound to a weight cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightCalculator {
    max_weight: f64,
}

impl WeightCalculator {
    pub fn new(config: &ReputationConfig) -> Self {
        Self { max_weight: config.max_weight.max(MIN_WEIGHT) }
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// Influence weight of a rater.
    ///
    /// Negative or non-finite portfolio values count as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_core::config::ReputationConfig;
    /// use lumen_trust::weight::WeightCalculator;
    ///
    /// let calc = WeightCalculator::new(&ReputationConfig::default());
    /// assert_eq!(calc.weight(0.0, 0), 1.0);
    /// assert!((calc.weight(999.0, 3) - 6.0).abs() < 1e-9);
    /// assert_eq!(calc.weight(1e300, 1_000_000), 100.0);
    /// ```
    pub fn weight(&self, portfolio: f64, connections: u32) -> f64 {
        let portfolio = if portfolio.is_finite() && portfolio > 0.0 { portfolio } else { 0.0 };
        let raw = (portfolio + 1.0).log10() * (f64::from(connections) + 1.0).sqrt();
        raw.clamp(MIN_WEIGHT, self.max_weight)
    }
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new(&ReputationConfig::default())
    }
}
