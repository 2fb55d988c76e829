//! Statistical significance of observed hit rates.
//!
//! A one-proportion z-test against a baseline rate, a Wilson score interval,
//! and a fixed four-tier strength classification shared by every consumer
//! (query results, situational angles, pick scoring).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// No-edge reference rate for binary outcomes.
pub const DEFAULT_BASELINE: f64 = 0.5;

/// Two-sided 95% critical value.
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Statistical strength of an observed edge, ordered `Noise < Weak < Moderate < Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Noise,
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// Weight applied to an angle of this strength when scoring picks.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Strong => 1.0,
            Self::Moderate => 0.7,
            Self::Weak => 0.4,
            Self::Noise => 0.0,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong trend",
            Self::Moderate => "Moderate trend",
            Self::Weak => "Weak trend",
            Self::Noise => "Not significant",
        }
    }

    #[must_use]
    pub const fn is_significant(self) -> bool {
        matches!(self, Self::Strong | Self::Moderate)
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
            Self::Noise => "noise",
        };
        f.write_str(s)
    }
}

/// Outcome of testing an observed rate against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceResult {
    pub strength: Strength,
    pub label: String,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// `wins / (wins + losses)`, absent for an empty sample.
    pub observed_rate: Option<f64>,
    pub baseline_rate: f64,
    /// 95% Wilson score interval, absent for an empty sample.
    pub confidence_interval: Option<(f64, f64)>,
    pub z_score: f64,
    /// `wins + losses`; pushes never count.
    pub sample_size: u32,
    pub is_significant: bool,
}

/// Tests `wins / (wins + losses)` against `baseline_rate`.
///
/// # Errors
/// Returns `InvalidBaseline` unless `0 < baseline_rate < 1`. Any pair of
/// counts is accepted, including `0, 0`.
///
/// # Examples
/// ```
/// use trend_engine_core::significance::{compute_significance, Strength};
///
/// let result = compute_significance(112, 88, 0.5).unwrap();
/// assert!((result.z_score - 1.697).abs() < 0.01);
/// assert_eq!(result.strength, Strength::Weak);
/// ```
pub fn compute_significance(
    wins: u32,
    losses: u32,
    baseline_rate: f64,
) -> Result<SignificanceResult, ValidationError> {
    if !baseline_rate.is_finite() || baseline_rate <= 0.0 || baseline_rate >= 1.0 {
        return Err(ValidationError::InvalidBaseline(baseline_rate));
    }

    let n = wins.saturating_add(losses);
    if n == 0 {
        return Ok(SignificanceResult {
            strength: Strength::Noise,
            label: "Insufficient sample".to_string(),
            p_value: 1.0,
            observed_rate: None,
            baseline_rate,
            confidence_interval: None,
            z_score: 0.0,
            sample_size: 0,
            is_significant: false,
        });
    }

    let n_f = f64::from(n);
    let observed = f64::from(wins) / n_f;
    let se = (baseline_rate * (1.0 - baseline_rate) / n_f).sqrt();
    let z_score = if observed == baseline_rate {
        0.0
    } else {
        (observed - baseline_rate) / se
    };
    let p_value = two_tailed_p_value(z_score);
    let strength = classify_strength(n, p_value);

    Ok(SignificanceResult {
        strength,
        label: strength.label().to_string(),
        p_value,
        observed_rate: Some(observed),
        baseline_rate,
        confidence_interval: wilson_ci(wins, n, Z_95),
        z_score,
        sample_size: n,
        is_significant: strength.is_significant(),
    })
}

/// Maps a sample size and p-value to a strength tier.
///
/// - `strong`: `n >= 30` and `p < 0.01`
/// - `moderate`: `n >= 20` and `p < 0.05`
/// - `weak`: `n >= 10` and `p < 0.10`
/// - `noise` otherwise
#[must_use]
pub fn classify_strength(n: u32, p_value: f64) -> Strength {
    if n >= 30 && p_value < 0.01 {
        Strength::Strong
    } else if n >= 20 && p_value < 0.05 {
        Strength::Moderate
    } else if n >= 10 && p_value < 0.10 {
        Strength::Weak
    } else {
        Strength::Noise
    }
}

/// Calculates the Wilson score confidence interval for a proportion.
///
/// Preferred over the normal approximation near 0 or 1 and for small
/// samples.
///
/// ```text
/// CI = (p + z^2/(2n) +/- z * sqrt(p(1-p)/n + z^2/(4n^2))) / (1 + z^2/n)
/// ```
///
/// Returns `None` for `n == 0`.
///
/// # Examples
/// ```
/// use trend_engine_core::significance::wilson_ci;
///
/// let (lower, upper) = wilson_ci(50, 100, 1.96).unwrap();
/// assert!(lower > 0.39 && lower < 0.41);
/// assert!(upper > 0.59 && upper < 0.61);
/// ```
#[must_use]
pub fn wilson_ci(wins: u32, n: u32, z: f64) -> Option<(f64, f64)> {
    if n == 0 {
        return None;
    }

    let n_f = f64::from(n);
    let p = f64::from(wins.min(n)) / n_f;
    let z_sq = z * z;

    let denominator = 1.0 + z_sq / n_f;
    let center = p + z_sq / (2.0 * n_f);

    let variance_term = p * (1.0 - p) / n_f;
    let correction_term = z_sq / (4.0 * n_f * n_f);
    let spread = z * (variance_term + correction_term).sqrt();

    let lower = (center - spread) / denominator;
    let upper = (center + spread) / denominator;

    Some((lower.max(0.0), upper.min(1.0)))
}

/// Two-tailed p-value of a z statistic under the standard normal.
#[must_use]
pub fn two_tailed_p_value(z: f64) -> f64 {
    if z == 0.0 {
        return 1.0;
    }
    (2.0 * (1.0 - standard_normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Standard normal CDF, Abramowitz and Stegun formula 26.2.17.
/// Accurate to about 7.5e-8.
#[must_use]
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x < 0.0 {
        return 1.0 - standard_normal_cdf(-x);
    }

    let b1 = 0.319_381_530;
    let b2 = -0.356_563_782;
    let b3 = 1.781_477_937;
    let b4 = -1.821_255_978;
    let b5 = 1.330_274_429;
    let p = 0.231_641_9;

    let t = 1.0 / (1.0 + p * x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    1.0 - pdf * (b1 * t + b2 * t2 + b3 * t3 + b4 * t4 + b5 * t5)
}
