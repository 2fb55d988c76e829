//! Kelly Criterion stake sizing for fixed-odds bets.
//!
//! Sizes a single wager (a straight bet, a parlay, or a teaser) priced in
//! decimal odds, using fractional Kelly with an optional absolute cap.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kelly Criterion bet sizer for fixed-odds wagers.
///
/// For decimal odds `d` and win probability `p`, with net odds `b = d - 1`:
/// ```text
/// f* = max(0, (b*p - (1-p)) / b)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellySizer {
    /// Fraction of Kelly to stake (0.25 = quarter Kelly)
    pub fraction: Decimal,
    /// Maximum stake in absolute terms, if any
    pub max_stake: Option<Decimal>,
    /// Minimum edge (`p - 1/d`) required to recommend a stake
    pub min_edge: Decimal,
}

impl Default for KellySizer {
    fn default() -> Self {
        Self {
            fraction: Decimal::new(25, 2), // quarter Kelly
            max_stake: None,
            min_edge: Decimal::ZERO,
        }
    }
}

/// Result of Kelly stake sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetDecision {
    /// Whether a stake is recommended
    pub should_bet: bool,
    /// Recommended stake, rounded to cents
    pub stake: Decimal,
    /// Full Kelly fraction, floored at zero
    pub full_kelly_fraction: Decimal,
    /// Fraction of bankroll actually staked
    pub stake_fraction: Decimal,
    /// Expected profit per unit staked
    pub expected_value: Decimal,
    pub reason: BetReason,
}

/// Reason for a bet decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetReason {
    /// Positive expected value above the edge threshold
    PositiveEdge,
    /// Positive EV but edge below the minimum
    InsufficientEdge,
    /// Expected value at or below zero
    NegativeEv,
    /// Probability outside [0, 1], odds not above 1, or bankroll not positive
    InvalidInputs,
}

impl KellySizer {
    #[must_use]
    pub fn new(fraction: Decimal, max_stake: Option<Decimal>, min_edge: Decimal) -> Self {
        Self {
            fraction,
            max_stake,
            min_edge,
        }
    }

    /// Full Kelly fraction for a bet at `decimal_odds` won with `win_prob`.
    ///
    /// Returns zero for invalid inputs or non-positive edges.
    #[must_use]
    pub fn kelly_fraction(win_prob: Decimal, decimal_odds: Decimal) -> Decimal {
        if win_prob < Decimal::ZERO || win_prob > Decimal::ONE || decimal_odds <= Decimal::ONE {
            return Decimal::ZERO;
        }
        let b = decimal_odds - Decimal::ONE;
        let f = (b * win_prob - (Decimal::ONE - win_prob)) / b;
        f.max(Decimal::ZERO)
    }

    /// Expected profit per unit staked: `p*(d-1) - (1-p)`.
    #[must_use]
    pub fn expected_value(win_prob: Decimal, decimal_odds: Decimal) -> Decimal {
        if decimal_odds <= Decimal::ONE {
            return Decimal::ZERO;
        }
        win_prob * (decimal_odds - Decimal::ONE) - (Decimal::ONE - win_prob)
    }

    /// Sizes a stake using fractional Kelly.
    ///
    /// # Examples
    /// ```
    /// use trend_engine_core::kelly::KellySizer;
    /// use rust_decimal_macros::dec;
    ///
    /// let sizer = KellySizer::default();
    /// // 60% to win at even money
    /// let decision = sizer.size(dec!(0.6), dec!(2.0), dec!(1000));
    ///
    /// assert!(decision.should_bet);
    /// assert_eq!(decision.stake, dec!(50.00));
    /// ```
    #[must_use]
    pub fn size(&self, win_prob: Decimal, decimal_odds: Decimal, bankroll: Decimal) -> BetDecision {
        if win_prob < Decimal::ZERO
            || win_prob > Decimal::ONE
            || decimal_odds <= Decimal::ONE
            || bankroll <= Decimal::ZERO
        {
            return BetDecision::no_bet(Decimal::ZERO, Decimal::ZERO, BetReason::InvalidInputs);
        }

        let ev = Self::expected_value(win_prob, decimal_odds);
        let full_kelly = Self::kelly_fraction(win_prob, decimal_odds);

        if ev <= Decimal::ZERO {
            return BetDecision::no_bet(full_kelly, ev, BetReason::NegativeEv);
        }

        let edge = win_prob - Decimal::ONE / decimal_odds;
        if edge < self.min_edge {
            return BetDecision::no_bet(full_kelly, ev, BetReason::InsufficientEdge);
        }

        let stake_fraction = full_kelly * self.fraction;
        let mut stake = bankroll * stake_fraction;
        if let Some(cap) = self.max_stake {
            stake = stake.min(cap);
        }
        let stake = stake.max(Decimal::ZERO).round_dp(2);

        BetDecision {
            should_bet: stake > Decimal::ZERO,
            stake,
            full_kelly_fraction: full_kelly,
            stake_fraction,
            expected_value: ev,
            reason: BetReason::PositiveEdge,
        }
    }
}

impl BetDecision {
    fn no_bet(full_kelly_fraction: Decimal, expected_value: Decimal, reason: BetReason) -> Self {
        Self {
            should_bet: false,
            stake: Decimal::ZERO,
            full_kelly_fraction,
            stake_fraction: Decimal::ZERO,
            expected_value,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ============================================
    // Kelly fraction
    // ============================================

    #[test]
    fn even_money_sixty_percent_is_twenty_percent_kelly() {
        let f = KellySizer::kelly_fraction(dec!(0.6), dec!(2.0));
        assert_eq!(f, dec!(0.2));
    }

    #[test]
    fn negative_edge_floors_at_zero() {
        let f = KellySizer::kelly_fraction(dec!(0.4), dec!(2.0));
        assert_eq!(f, Decimal::ZERO);
    }

    #[test]
    fn invalid_odds_give_zero_fraction() {
        assert_eq!(KellySizer::kelly_fraction(dec!(0.9), dec!(1.0)), Decimal::ZERO);
        assert_eq!(KellySizer::kelly_fraction(dec!(0.9), dec!(0.5)), Decimal::ZERO);
    }

    // ============================================
    // Expected value
    // ============================================

    #[test]
    fn fair_coin_at_even_money_has_zero_ev() {
        assert_eq!(KellySizer::expected_value(dec!(0.5), dec!(2.0)), Decimal::ZERO);
    }

    #[test]
    fn ev_at_minus_110() {
        // -110 is 1.9090...; a coin flip loses about 4.5 cents
        let d = dec!(1.9090909091);
        let ev = KellySizer::expected_value(dec!(0.5), d);
        assert!(ev < dec!(-0.045) && ev > dec!(-0.046));
    }

    // ============================================
    // Sizing
    // ============================================

    #[test]
    fn quarter_kelly_stake() {
        let sizer = KellySizer::default();
        let decision = sizer.size(dec!(0.6), dec!(2.0), dec!(1000));
        assert!(decision.should_bet);
        assert_eq!(decision.full_kelly_fraction, dec!(0.2));
        assert_eq!(decision.stake_fraction, dec!(0.05));
        assert_eq!(decision.stake, dec!(50.00));
        assert_eq!(decision.reason, BetReason::PositiveEdge);
    }

    #[test]
    fn stake_is_capped() {
        let sizer = KellySizer::new(dec!(0.25), Some(dec!(20)), Decimal::ZERO);
        let decision = sizer.size(dec!(0.6), dec!(2.0), dec!(1000));
        assert_eq!(decision.stake, dec!(20));
    }

    #[test]
    fn negative_ev_recommends_nothing() {
        let sizer = KellySizer::default();
        let decision = sizer.size(dec!(0.25), dec!(3.6), dec!(1000));
        assert!(!decision.should_bet);
        assert_eq!(decision.stake, Decimal::ZERO);
        assert_eq!(decision.reason, BetReason::NegativeEv);
    }

    #[test]
    fn insufficient_edge() {
        let sizer = KellySizer::new(dec!(0.25), None, dec!(0.05));
        // implied 0.5, edge 0.02
        let decision = sizer.size(dec!(0.52), dec!(2.0), dec!(1000));
        assert!(!decision.should_bet);
        assert_eq!(decision.reason, BetReason::InsufficientEdge);
    }

    #[test]
    fn invalid_bankroll() {
        let sizer = KellySizer::default();
        let decision = sizer.size(dec!(0.6), dec!(2.0), dec!(0));
        assert_eq!(decision.reason, BetReason::InvalidInputs);
    }

    #[test]
    fn invalid_probability() {
        let sizer = KellySizer::default();
        let decision = sizer.size(dec!(1.2), dec!(2.0), dec!(100));
        assert_eq!(decision.reason, BetReason::InvalidInputs);
    }
}
