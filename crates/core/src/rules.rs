//! Versioned confidence-tier rule tables.
//!
//! A rule table is an ordered list of tiers, highest first. The first rule
//! whose thresholds are all met assigns the tier; if none match, no pick is
//! made. Tables are configuration data and are recalibrated offline.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Thresholds for one confidence tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    /// Star rating assigned when the rule matches.
    pub stars: u8,
    /// Minimum trend score on the picked side.
    pub min_score: f64,
    /// Minimum weighted edge over baseline.
    pub min_edge: f64,
    /// Minimum share of absolute contribution pointing at the picked side.
    pub min_agreement: f64,
    /// Minimum number of angles supporting the picked side.
    pub min_supporting: usize,
}

impl TierRule {
    #[must_use]
    pub fn matches(&self, inputs: &TierInputs) -> bool {
        inputs.score >= self.min_score
            && inputs.edge >= self.min_edge
            && inputs.agreement >= self.min_agreement
            && inputs.supporting >= self.min_supporting
    }
}

/// Measures a candidate pick is tiered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInputs {
    pub score: f64,
    pub edge: f64,
    pub agreement: f64,
    pub supporting: usize,
}

/// Ordered, first-match-wins tier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: String,
    pub rules: Vec<TierRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            version: "2024.1".to_string(),
            rules: vec![
                TierRule {
                    stars: 5,
                    min_score: 3.0,
                    min_edge: 0.08,
                    min_agreement: 0.85,
                    min_supporting: 4,
                },
                TierRule {
                    stars: 4,
                    min_score: 2.2,
                    min_edge: 0.06,
                    min_agreement: 0.75,
                    min_supporting: 3,
                },
                TierRule {
                    stars: 3,
                    min_score: 1.5,
                    min_edge: 0.04,
                    min_agreement: 0.65,
                    min_supporting: 2,
                },
                TierRule {
                    stars: 2,
                    min_score: 0.9,
                    min_edge: 0.03,
                    min_agreement: 0.6,
                    min_supporting: 2,
                },
                TierRule {
                    stars: 1,
                    min_score: 0.4,
                    min_edge: 0.02,
                    min_agreement: 0.5,
                    min_supporting: 1,
                },
            ],
        }
    }
}

impl RuleTable {
    /// Checks that tiers are strictly descending and every threshold is
    /// non-increasing from a higher tier to a lower one, so a pick that
    /// qualifies for a tier also qualifies for every tier below it.
    ///
    /// # Errors
    /// Returns `InvalidRuleTable` describing the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidRuleTable {
            version: self.version.clone(),
            reason,
        };

        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty".to_string()));
        }
        if self.rules.is_empty() {
            return Err(invalid("table has no rules".to_string()));
        }

        for rule in &self.rules {
            if rule.stars == 0 {
                return Err(invalid("tier 0 is reserved for no pick".to_string()));
            }
            if !rule.min_score.is_finite() || rule.min_score <= 0.0 {
                return Err(invalid(format!(
                    "tier {} min_score must be positive",
                    rule.stars
                )));
            }
            if !rule.min_edge.is_finite() {
                return Err(invalid(format!("tier {} min_edge is not finite", rule.stars)));
            }
            if !(0.0..=1.0).contains(&rule.min_agreement) {
                return Err(invalid(format!(
                    "tier {} min_agreement must be in [0, 1]",
                    rule.stars
                )));
            }
        }

        for pair in self.rules.windows(2) {
            let (higher, lower) = (&pair[0], &pair[1]);
            if higher.stars <= lower.stars {
                return Err(invalid(format!(
                    "tiers must be strictly descending, found {} before {}",
                    higher.stars, lower.stars
                )));
            }
            if higher.min_score < lower.min_score
                || higher.min_edge < lower.min_edge
                || higher.min_agreement < lower.min_agreement
                || higher.min_supporting < lower.min_supporting
            {
                return Err(invalid(format!(
                    "tier {} has a looser threshold than tier {}",
                    higher.stars, lower.stars
                )));
            }
        }

        Ok(())
    }

    /// Assigns a tier, or `None` for no pick.
    #[must_use]
    pub fn assign(&self, inputs: &TierInputs) -> Option<u8> {
        self.rules
            .iter()
            .find(|rule| rule.matches(inputs))
            .map(|rule| rule.stars)
    }

    /// Score threshold of the lowest tier.
    #[must_use]
    pub fn lowest_threshold(&self) -> Option<f64> {
        self.rules.last().map(|rule| rule.min_score)
    }

    /// Star tiers in table order.
    #[must_use]
    pub fn tiers(&self) -> Vec<u8> {
        self.rules.iter().map(|rule| rule.stars).collect()
    }
}
