//! Two-leg spread teasers.
//!
//! Each leg's line moves a fixed number of points toward the bettor and its
//! win probability gets a fixed boost. The teased joint probability is then
//! priced against the fixed teaser payout.

use serde::{Deserialize, Serialize};
use std::fmt;
use trend_engine_core::{TeaserConfig, ValidationError};

use crate::odds::{american_to_decimal, check_probability};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaserLeg {
    /// Spread from the bettor's side; positive when getting points.
    pub line: f64,
    /// Probability of covering the original line.
    pub model_prob: f64,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TeaserLeg {
    #[must_use]
    pub fn new(line: f64, model_prob: f64) -> Self {
        Self {
            line,
            model_prob,
            game_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeasedLeg {
    pub description: Option<String>,
    pub original_line: f64,
    pub teased_line: f64,
    pub original_prob: f64,
    pub teased_prob: f64,
    /// Key margins the shift moves the line across.
    pub crossed_key_numbers: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeaserRating {
    Strong,
    Moderate,
    Avoid,
}

impl fmt::Display for TeaserRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Avoid => "avoid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaserAnalysis {
    pub legs: Vec<TeasedLeg>,
    pub points: f64,
    pub original_joint_prob: f64,
    pub teased_joint_prob: f64,
    pub payout_odds: i32,
    pub decimal_odds: f64,
    pub expected_value: f64,
    pub rating: TeaserRating,
}

impl TeaserAnalysis {
    /// True if any leg crosses a key number.
    #[must_use]
    pub fn crosses_key_numbers(&self) -> bool {
        self.legs.iter().any(|l| !l.crossed_key_numbers.is_empty())
    }
}

/// Key numbers whose margin flips from a loss to a cover.
///
/// A side at `line` covers when its margin beats `-line`; after teasing it
/// covers from `-teased`. Margins in `(-teased, -line]` are the ones gained.
fn crossed(line: f64, teased: f64, keys: &[f64]) -> Vec<f64> {
    let (low, high) = (-teased, -line);
    let mut out: Vec<f64> = keys
        .iter()
        .filter(|k| {
            let k = k.abs();
            (k > low && k <= high) || (-k > low && -k <= high)
        })
        .map(|k| k.abs())
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Classifies teaser EV: strong above `strong_ev`, moderate above zero.
#[must_use]
pub fn classify_teaser(expected_value: f64, strong_ev: f64) -> TeaserRating {
    if expected_value > strong_ev {
        TeaserRating::Strong
    } else if expected_value > 0.0 {
        TeaserRating::Moderate
    } else {
        TeaserRating::Avoid
    }
}

/// Teases two spread legs and prices the result.
///
/// # Errors
/// Rejects anything but exactly two legs, probabilities outside [0, 1],
/// non-finite lines and an invalid payout price.
pub fn analyze_teaser(
    legs: &[TeaserLeg],
    config: &TeaserConfig,
) -> Result<TeaserAnalysis, ValidationError> {
    if legs.len() != 2 {
        return Err(ValidationError::TeaserLegCount(legs.len()));
    }
    let decimal_odds = american_to_decimal(config.payout_odds)?;

    let teased = legs
        .iter()
        .enumerate()
        .map(|(i, leg)| {
            let p = check_probability(&format!("teaser leg {i}"), leg.model_prob)?;
            if !leg.line.is_finite() {
                return Err(ValidationError::InvalidQuery(format!(
                    "teaser leg {i} line is not finite"
                )));
            }
            let teased_line = leg.line + config.points;
            Ok(TeasedLeg {
                description: leg.description.clone(),
                original_line: leg.line,
                teased_line,
                original_prob: p,
                teased_prob: (p + config.probability_boost).min(config.max_probability),
                crossed_key_numbers: crossed(leg.line, teased_line, &config.key_numbers),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let original_joint_prob: f64 = teased.iter().map(|l| l.original_prob).product();
    let teased_joint_prob: f64 = teased.iter().map(|l| l.teased_prob).product();
    let expected_value = teased_joint_prob * (decimal_odds - 1.0) - (1.0 - teased_joint_prob);
    let rating = classify_teaser(expected_value, config.strong_ev);

    tracing::debug!(
        points = config.points,
        joint = teased_joint_prob,
        expected_value,
        %rating,
        "analyzed teaser"
    );

    Ok(TeaserAnalysis {
        legs: teased,
        points: config.points,
        original_joint_prob,
        teased_joint_prob,
        payout_odds: config.payout_odds,
        decimal_odds,
        expected_value,
        rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TeaserConfig {
        TeaserConfig::default()
    }

    #[test]
    fn two_sixty_percent_legs() {
        let legs = [TeaserLeg::new(-7.5, 0.60), TeaserLeg::new(1.5, 0.60)];
        let a = analyze_teaser(&legs, &config()).unwrap();

        assert!((a.teased_joint_prob - 0.5625).abs() < 1e-12);
        assert!((a.original_joint_prob - 0.36).abs() < 1e-12);
        assert!(a.expected_value > 0.0);
        assert!((a.expected_value - 0.073_863_6).abs() < 1e-6);
        assert!(matches!(a.rating, TeaserRating::Strong | TeaserRating::Moderate));
        assert_eq!(a.rating, TeaserRating::Moderate);
        assert!((a.legs[0].teased_line - (-1.5)).abs() < 1e-12);
        assert!((a.legs[1].teased_line - 7.5).abs() < 1e-12);
    }

    #[test]
    fn wong_legs_cross_both_key_numbers() {
        let legs = [TeaserLeg::new(-7.5, 0.6), TeaserLeg::new(1.5, 0.6)];
        let a = analyze_teaser(&legs, &config()).unwrap();
        assert_eq!(a.legs[0].crossed_key_numbers, vec![3.0, 7.0]);
        assert_eq!(a.legs[1].crossed_key_numbers, vec![3.0, 7.0]);
        assert!(a.crosses_key_numbers());
    }

    #[test]
    fn shift_that_misses_key_numbers() {
        // -10.5 to -4.5 gains margins 5 through 10
        assert_eq!(crossed(-10.5, -4.5, &[3.0, 7.0]), vec![7.0]);
        // +7.5 to +13.5 gains losses by 8 through 13
        assert!(crossed(7.5, 13.5, &[3.0, 7.0]).is_empty());
        // -3 teased to +3: a 3-point win goes from push to cover
        assert_eq!(crossed(-3.0, 3.0, &[3.0, 7.0]), vec![3.0]);
    }

    #[test]
    fn boosted_probability_is_capped() {
        let legs = [TeaserLeg::new(-2.5, 0.95), TeaserLeg::new(-2.5, 0.95)];
        let a = analyze_teaser(&legs, &config()).unwrap();
        assert!((a.legs[0].teased_prob - 0.99).abs() < 1e-12);
        assert_eq!(a.rating, TeaserRating::Strong);
    }

    #[test]
    fn weak_legs_are_avoided() {
        let legs = [TeaserLeg::new(-3.0, 0.5), TeaserLeg::new(-3.0, 0.5)];
        let a = analyze_teaser(&legs, &config()).unwrap();
        // 0.65^2 = 0.4225 at -110
        assert!(a.expected_value < 0.0);
        assert_eq!(a.rating, TeaserRating::Avoid);
    }

    #[test]
    fn leg_count_must_be_two() {
        assert_eq!(
            analyze_teaser(&[TeaserLeg::new(-3.0, 0.5)], &config()).unwrap_err(),
            ValidationError::TeaserLegCount(1)
        );
        let three = vec![TeaserLeg::new(-3.0, 0.5); 3];
        assert!(analyze_teaser(&three, &config()).is_err());
    }

    #[test]
    fn invalid_leg_probability() {
        let legs = [TeaserLeg::new(-3.0, -0.1), TeaserLeg::new(-3.0, 0.5)];
        assert!(matches!(
            analyze_teaser(&legs, &config()),
            Err(ValidationError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify_teaser(0.11, 0.10), TeaserRating::Strong);
        assert_eq!(classify_teaser(0.10, 0.10), TeaserRating::Moderate);
        assert_eq!(classify_teaser(0.0, 0.10), TeaserRating::Avoid);
    }
}
