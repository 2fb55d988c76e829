//! Tier backtesting.
//!
//! Checks a rule table against graded history: per-tier record, win rate and
//! Wilson interval, plus any pair of tiers where the higher one realised a
//! lower win rate than the one below it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trend_engine_core::significance::{wilson_ci, Z_95};
use trend_engine_core::{RuleTable, TierInputs, ValidationError};

use crate::pick::{Pick, PickResult};

/// A graded candidate pick with the measures it was tiered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSample {
    pub game_id: String,
    pub season: i32,
    pub inputs: TierInputs,
    pub result: PickResult,
}

impl HistoricalSample {
    /// Sample from a graded pick; `None` while the pick is pending.
    #[must_use]
    pub fn from_pick(pick: &Pick, season: i32) -> Option<Self> {
        pick.is_graded().then(|| Self {
            game_id: pick.game_id.clone(),
            season,
            inputs: TierInputs {
                score: pick.trend_score,
                edge: pick.edge,
                agreement: pick.agreement,
                supporting: pick.supporting,
            },
            result: pick.result,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierReport {
    pub stars: u8,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    /// `wins / (wins + losses)`; absent with no decided picks.
    pub win_rate: Option<f64>,
    pub confidence_interval: Option<(f64, f64)>,
}

impl TierReport {
    fn new(stars: u8) -> Self {
        Self {
            stars,
            wins: 0,
            losses: 0,
            pushes: 0,
            win_rate: None,
            confidence_interval: None,
        }
    }

    fn record(&mut self, result: PickResult) {
        match result {
            PickResult::Win => self.wins += 1,
            PickResult::Loss => self.losses += 1,
            PickResult::Push => self.pushes += 1,
            PickResult::Pending => return,
        }
        let decided = self.wins + self.losses;
        self.win_rate = (decided > 0).then(|| f64::from(self.wins) / f64::from(decided));
        self.confidence_interval = wilson_ci(self.wins, decided, Z_95);
    }

    #[must_use]
    pub const fn decided(&self) -> u32 {
        self.wins + self.losses
    }
}

/// A higher tier that realised a lower win rate than the next tier down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonotonicityViolation {
    pub higher: u8,
    pub lower: u8,
    pub higher_rate: f64,
    pub lower_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBacktest {
    pub version: String,
    /// Highest tier first.
    pub tiers: Vec<TierReport>,
    /// Samples no tier accepted.
    pub no_pick: u32,
    /// Pending picks or picks whose tier is not in the table.
    pub skipped: u32,
    pub violations: Vec<MonotonicityViolation>,
}

impl TierBacktest {
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn tier(&self, stars: u8) -> Option<&TierReport> {
        self.tiers.iter().find(|t| t.stars == stars)
    }

    fn build(table: &RuleTable, graded: impl IntoIterator<Item = (Option<u8>, PickResult)>) -> Self {
        let mut tiers: BTreeMap<u8, TierReport> = table
            .tiers()
            .into_iter()
            .map(|stars| (stars, TierReport::new(stars)))
            .collect();
        let mut no_pick = 0;
        let mut skipped = 0;

        for (stars, result) in graded {
            if result == PickResult::Pending {
                skipped += 1;
                continue;
            }
            match stars {
                None => no_pick += 1,
                Some(s) => match tiers.get_mut(&s) {
                    Some(report) => report.record(result),
                    None => skipped += 1,
                },
            }
        }

        let tiers: Vec<TierReport> = tiers.into_values().rev().collect();
        let violations = find_violations(&tiers);
        for v in &violations {
            tracing::warn!(
                table = %table.version,
                higher = v.higher,
                lower = v.lower,
                higher_rate = v.higher_rate,
                lower_rate = v.lower_rate,
                "tier monotonicity violated"
            );
        }

        Self {
            version: table.version.clone(),
            tiers,
            no_pick,
            skipped,
            violations,
        }
    }
}

/// Compares each tier with data against the next lower tier with data.
fn find_violations(tiers: &[TierReport]) -> Vec<MonotonicityViolation> {
    let rated: Vec<(u8, f64)> = tiers
        .iter()
        .filter_map(|t| t.win_rate.map(|r| (t.stars, r)))
        .collect();
    rated
        .windows(2)
        .filter(|pair| pair[0].1 < pair[1].1)
        .map(|pair| MonotonicityViolation {
            higher: pair[0].0,
            lower: pair[1].0,
            higher_rate: pair[0].1,
            lower_rate: pair[1].1,
        })
        .collect()
}

/// Reports graded picks by the tier they were issued with.
#[must_use]
pub fn backtest_picks(picks: &[Pick], table: &RuleTable) -> TierBacktest {
    TierBacktest::build(
        table,
        picks.iter().map(|p| (Some(p.confidence), p.result)),
    )
}

/// Re-tiers historical samples under a candidate table.
///
/// # Errors
/// Returns `InvalidRuleTable` if the table is malformed.
pub fn replay(samples: &[HistoricalSample], table: &RuleTable) -> Result<TierBacktest, ValidationError> {
    table.validate()?;
    let report = TierBacktest::build(
        table,
        samples.iter().map(|s| (table.assign(&s.inputs), s.result)),
    );
    tracing::debug!(
        table = %table.version,
        samples = samples.len(),
        no_pick = report.no_pick,
        "replayed tier table"
    );
    Ok(report)
}

/// Replay split into calibration seasons and one held-out season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldoutValidation {
    pub holdout_season: i32,
    pub calibration: TierBacktest,
    pub holdout: TierBacktest,
    /// Tiers stay monotonic on both splits.
    pub passed: bool,
}

/// Replays `table` on every season but `holdout_season`, then on that
/// season alone.
///
/// # Errors
/// Returns `InvalidRuleTable` if the table is malformed.
pub fn validate_holdout(
    samples: &[HistoricalSample],
    table: &RuleTable,
    holdout_season: i32,
) -> Result<HoldoutValidation, ValidationError> {
    let (held, calib): (Vec<HistoricalSample>, Vec<HistoricalSample>) = samples
        .iter()
        .cloned()
        .partition(|s| s.season == holdout_season);

    let calibration = replay(&calib, table)?;
    let holdout = replay(&held, table)?;
    let passed = calibration.is_monotonic() && holdout.is_monotonic();
    tracing::info!(
        table = %table.version,
        holdout_season,
        passed,
        "validated tier table on held-out season"
    );

    Ok(HoldoutValidation {
        holdout_season,
        calibration,
        holdout,
        passed,
    })
}
