use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::kelly::KellySizer;
use crate::rules::RuleTable;
use crate::significance::DEFAULT_BASELINE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub tiers: RuleTable,
    pub parlay: ParlayConfig,
    pub teaser: TeaserConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
}

/// Angle weighting used by the pick scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Baseline rate angles are tested against.
    pub baseline_rate: f64,
    /// Weight for angles without an explicit entry.
    pub default_weight: f64,
    /// Weight per angle weight key.
    pub angle_weights: BTreeMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let angle_weights = [
            ("rest", 1.0),
            ("schedule", 0.8),
            ("line", 1.2),
            ("ranking", 0.9),
            ("form", 0.7),
            ("weather", 0.6),
            ("venue", 0.8),
            ("rating", 1.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            baseline_rate: DEFAULT_BASELINE,
            default_weight: 1.0,
            angle_weights,
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn weight_for(&self, key: &str) -> f64 {
        self.angle_weights
            .get(key)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParlayConfig {
    /// Fraction of full Kelly to stake.
    pub kelly_fraction: Decimal,
    pub max_stake: Option<Decimal>,
    pub min_edge: Decimal,
    /// Pairwise correlation applied to legs sharing a game. Zero treats
    /// same-game legs as independent; revalidate periodically.
    pub same_game_correlation: f64,
}

impl Default for ParlayConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: Decimal::new(25, 2),
            max_stake: None,
            min_edge: Decimal::ZERO,
            same_game_correlation: 0.0,
        }
    }
}

impl ParlayConfig {
    #[must_use]
    pub fn sizer(&self) -> KellySizer {
        KellySizer::new(self.kelly_fraction, self.max_stake, self.min_edge)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeaserConfig {
    /// Points each leg's line moves in the bettor's favor.
    pub points: f64,
    /// Probability added to each leg.
    pub probability_boost: f64,
    /// American odds paid by a two-leg teaser.
    pub payout_odds: i32,
    /// EV above which a teaser is classified strong.
    pub strong_ev: f64,
    /// Ceiling on a boosted leg probability.
    pub max_probability: f64,
    /// Margins a teased line is checked against.
    pub key_numbers: Vec<f64>,
}

impl Default for TeaserConfig {
    fn default() -> Self {
        Self {
            points: 6.0,
            probability_boost: 0.15,
            payout_odds: -110,
            strong_ev: 0.10,
            max_probability: 0.99,
            key_numbers: vec![3.0, 7.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached rating table.
    pub rating_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            rating_ttl_secs: 6 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub records_path: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            records_path: None,
            max_connections: 5,
        }
    }
}

impl EngineConfig {
    /// Range-checks every section.
    ///
    /// # Errors
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let s = &self.scoring;
        if !s.baseline_rate.is_finite() || s.baseline_rate <= 0.0 || s.baseline_rate >= 1.0 {
            return Err(ValidationError::InvalidBaseline(s.baseline_rate));
        }
        if !s.default_weight.is_finite() || s.default_weight < 0.0 {
            return Err(ValidationError::InvalidConfig(
                "scoring.default_weight must be finite and non-negative".to_string(),
            ));
        }
        if let Some((key, _)) = s
            .angle_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ValidationError::InvalidConfig(format!(
                "scoring.angle_weights.{key} must be finite and non-negative"
            )));
        }

        self.tiers.validate()?;

        let p = &self.parlay;
        if p.kelly_fraction <= Decimal::ZERO || p.kelly_fraction > Decimal::ONE {
            return Err(ValidationError::InvalidConfig(
                "parlay.kelly_fraction must be in (0, 1]".to_string(),
            ));
        }
        if p.max_stake.is_some_and(|cap| cap <= Decimal::ZERO) {
            return Err(ValidationError::InvalidConfig(
                "parlay.max_stake must be positive".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&p.same_game_correlation) {
            return Err(ValidationError::InvalidConfig(
                "parlay.same_game_correlation must be in [-1, 1]".to_string(),
            ));
        }

        let t = &self.teaser;
        if !t.points.is_finite() || t.points <= 0.0 {
            return Err(ValidationError::InvalidConfig(
                "teaser.points must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&t.probability_boost) {
            return Err(ValidationError::InvalidProbability {
                context: "teaser.probability_boost".to_string(),
                value: t.probability_boost,
            });
        }
        if !(0.0..=1.0).contains(&t.max_probability) {
            return Err(ValidationError::InvalidProbability {
                context: "teaser.max_probability".to_string(),
                value: t.max_probability,
            });
        }
        if !matches!(t.payout_odds.checked_abs(), Some(m) if m >= 100) {
            return Err(ValidationError::InvalidOdds(format!(
                "teaser.payout_odds {} is not valid American odds",
                t.payout_odds
            )));
        }

        if self.cache.rating_ttl_secs == 0 {
            return Err(ValidationError::InvalidConfig(
                "cache.rating_ttl_secs must be positive".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            return Err(ValidationError::InvalidConfig(
                "store.max_connections must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn weight_falls_back_to_default() {
        let scoring = ScoringConfig::default();
        assert!((scoring.weight_for("line") - 1.2).abs() < f64::EPSILON);
        assert!((scoring.weight_for("unknown") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_negative_weight() {
        let mut config = EngineConfig::default();
        config.scoring.angle_weights.insert("rest".to_string(), -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_kelly_fraction() {
        let mut config = EngineConfig::default();
        config.parlay.kelly_fraction = dec!(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_correlation() {
        let mut config = EngineConfig::default();
        config.parlay.same_game_correlation = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_teaser_payout_inside_the_gap_or_unrepresentable() {
        let mut config = EngineConfig::default();
        config.teaser.payout_odds = 50;
        assert!(config.validate().is_err());
        config.teaser.payout_odds = i32::MIN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_tier_table() {
        let mut config = EngineConfig::default();
        config.tiers.rules.reverse();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRuleTable { .. })
        ));
    }

    #[test]
    fn parlay_sizer_uses_configured_fraction() {
        let config = ParlayConfig::default();
        assert_eq!(config.sizer().fraction, dec!(0.25));
    }
}
