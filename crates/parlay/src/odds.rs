//! American and decimal odds.
//!
//! American odds of `+150` pay 150 on a 100 stake (decimal 2.5); `-110`
//! risks 110 to win 100 (decimal ~1.909). Values strictly between -100 and
//! +100 are not valid American odds.

use trend_engine_core::ValidationError;

/// Decimal odds for an American price.
///
/// # Errors
/// Returns `InvalidOdds` for values strictly between -100 and +100, and
/// for `i32::MIN`, which has no positive counterpart.
pub fn american_to_decimal(odds: i32) -> Result<f64, ValidationError> {
    if !matches!(odds.checked_abs(), Some(magnitude) if magnitude >= 100) {
        return Err(ValidationError::InvalidOdds(format!(
            "american odds {odds} must be <= -100 or >= +100"
        )));
    }
    let odds = f64::from(odds);
    Ok(if odds > 0.0 {
        1.0 + odds / 100.0
    } else {
        1.0 + 100.0 / -odds
    })
}

/// American odds for a decimal price, rounded half to even.
///
/// ```
/// use trend_engine_parlay::odds::decimal_to_american;
///
/// assert_eq!(decimal_to_american(2.5).unwrap(), 150);
/// assert_eq!(decimal_to_american(1.5).unwrap(), -200);
/// ```
///
/// # Errors
/// Returns `InvalidOdds` for decimal odds at or below 1, non-finite odds,
/// or prices too long to express.
pub fn decimal_to_american(decimal: f64) -> Result<i32, ValidationError> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return Err(ValidationError::InvalidOdds(format!(
            "decimal odds {decimal} must be greater than 1"
        )));
    }
    let american = if decimal >= 2.0 {
        (decimal - 1.0) * 100.0
    } else {
        -100.0 / (decimal - 1.0)
    }
    .round_ties_even();

    if american > f64::from(i32::MAX) || american < f64::from(i32::MIN) {
        return Err(ValidationError::InvalidOdds(format!(
            "decimal odds {decimal} are out of range"
        )));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(american as i32)
}

/// Break-even probability implied by an American price, vig included.
///
/// # Errors
/// Returns `InvalidOdds` for values strictly between -100 and +100.
pub fn implied_probability(odds: i32) -> Result<f64, ValidationError> {
    Ok(1.0 / american_to_decimal(odds)?)
}

/// Checks that `value` is a finite probability in [0, 1].
///
/// # Errors
/// Returns `InvalidProbability` naming `context`.
pub fn check_probability(context: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidProbability {
            context: context.to_string(),
            value,
        })
    }
}
