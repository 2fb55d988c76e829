//! Parlay and teaser analysis.
//!
//! Prices multi-leg bets from per-leg odds and model probabilities and
//! sizes stakes with fractional Kelly.

pub mod odds;
pub mod parlay;
pub mod teaser;

use rust_decimal::Decimal;

pub use odds::{american_to_decimal, decimal_to_american, implied_probability};
pub use parlay::{analyze_parlay, ParlayAnalysis, ParlayLeg};
pub use teaser::{analyze_teaser, classify_teaser, TeaserAnalysis, TeaserLeg, TeaserRating, TeasedLeg};

/// Probabilities and odds enter the Kelly sizer as decimals.
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(12))
        .unwrap_or_default()
}
