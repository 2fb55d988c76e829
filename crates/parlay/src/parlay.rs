//! Parlay analysis.
//!
//! Legs are priced independently and multiplied. Legs sharing a game can be
//! adjusted with a pairwise correlation from configuration; at the default
//! of zero they are treated as independent like any other pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trend_engine_core::{BetDecision, ParlayConfig, ValidationError};

use crate::odds::{american_to_decimal, check_probability, decimal_to_american, implied_probability};
use crate::to_decimal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParlayLeg {
    /// American odds of the leg.
    pub odds: i32,
    /// Book probability; derived from `odds` when absent.
    #[serde(default)]
    pub implied_prob: Option<f64>,
    /// Our probability of the leg winning.
    pub model_prob: f64,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParlayLeg {
    #[must_use]
    pub fn new(odds: i32, model_prob: f64) -> Self {
        Self {
            odds,
            implied_prob: None,
            model_prob,
            game_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_game(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    #[must_use]
    pub fn with_implied_prob(mut self, p: f64) -> Self {
        self.implied_prob = Some(p);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParlayAnalysis {
    pub legs: usize,
    /// Joint model probability after any same-game adjustment.
    pub true_joint_prob: f64,
    /// Product of the model probabilities.
    pub independent_joint_prob: f64,
    pub book_implied_prob: f64,
    pub decimal_odds: f64,
    pub american_odds: i32,
    /// Expected profit per unit staked.
    pub expected_value: f64,
    /// Full Kelly fraction, floored at zero.
    pub kelly_fraction: f64,
    /// `true_joint_prob - book_implied_prob`
    pub edge: f64,
    pub correlation: f64,
    pub same_game_pairs: usize,
    pub recommended_stake: Decimal,
    pub bet: BetDecision,
}

impl ParlayAnalysis {
    #[must_use]
    pub fn is_positive_ev(&self) -> bool {
        self.expected_value > 0.0
    }
}

/// Validated per-leg figures.
struct PricedLeg<'a> {
    decimal: f64,
    implied: f64,
    model: f64,
    game_id: Option<&'a str>,
}

fn price_leg(index: usize, leg: &ParlayLeg) -> Result<PricedLeg<'_>, ValidationError> {
    let decimal = american_to_decimal(leg.odds)?;
    let implied = match leg.implied_prob {
        Some(p) => check_probability(&format!("leg {index} implied"), p)?,
        None => implied_probability(leg.odds)?,
    };
    let model = check_probability(&format!("leg {index} model"), leg.model_prob)?;
    Ok(PricedLeg {
        decimal,
        implied,
        model,
        game_id: leg.game_id.as_deref(),
    })
}

/// Multiplier on a joint probability for two correlated binary legs.
///
/// `P(A and B) = pa*pb + rho*sqrt(pa(1-pa)pb(1-pb))`, expressed as a factor
/// on `pa*pb`.
fn correlation_factor(pa: f64, pb: f64, rho: f64) -> f64 {
    if pa <= 0.0 || pb <= 0.0 {
        return 1.0;
    }
    1.0 + rho * ((1.0 - pa) * (1.0 - pb) / (pa * pb)).sqrt()
}

/// Prices a parlay and sizes a stake against `bankroll`.
///
/// # Errors
/// Rejects fewer than two legs, invalid odds or probabilities, and a
/// non-positive bankroll before computing anything.
pub fn analyze_parlay(
    legs: &[ParlayLeg],
    bankroll: Decimal,
    config: &ParlayConfig,
) -> Result<ParlayAnalysis, ValidationError> {
    if legs.len() < 2 {
        return Err(ValidationError::TooFewLegs(legs.len()));
    }
    if bankroll <= Decimal::ZERO {
        return Err(ValidationError::InvalidBankroll(bankroll.to_string()));
    }
    let priced = legs
        .iter()
        .enumerate()
        .map(|(i, leg)| price_leg(i, leg))
        .collect::<Result<Vec<_>, _>>()?;

    let independent: f64 = priced.iter().map(|l| l.model).product();
    let book_implied_prob: f64 = priced.iter().map(|l| l.implied).product();
    let decimal_odds: f64 = priced.iter().map(|l| l.decimal).product();
    let american_odds = decimal_to_american(decimal_odds)?;

    let rho = config.same_game_correlation;
    let mut same_game_pairs = 0;
    let mut true_joint_prob = independent;
    for (i, a) in priced.iter().enumerate() {
        for b in &priced[i + 1..] {
            if a.game_id.is_some() && a.game_id == b.game_id {
                same_game_pairs += 1;
                if rho != 0.0 {
                    true_joint_prob *= correlation_factor(a.model, b.model, rho);
                }
            }
        }
    }
    let ceiling = priced.iter().map(|l| l.model).fold(1.0, f64::min);
    true_joint_prob = true_joint_prob.clamp(0.0, ceiling);

    let p = true_joint_prob;
    let b = decimal_odds - 1.0;
    let expected_value = p * b - (1.0 - p);
    let kelly_fraction = ((b * p - (1.0 - p)) / b).max(0.0);

    let bet = config
        .sizer()
        .size(to_decimal(p), to_decimal(decimal_odds), bankroll);

    tracing::debug!(
        legs = legs.len(),
        joint = p,
        decimal_odds,
        expected_value,
        same_game_pairs,
        "analyzed parlay"
    );

    Ok(ParlayAnalysis {
        legs: legs.len(),
        true_joint_prob: p,
        independent_joint_prob: independent,
        book_implied_prob,
        decimal_odds,
        american_odds,
        expected_value,
        kelly_fraction,
        edge: p - book_implied_prob,
        correlation: rho,
        same_game_pairs,
        recommended_stake: bet.stake,
        bet,
    })
}
