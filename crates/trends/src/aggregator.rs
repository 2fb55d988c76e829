//! Trend Aggregator.
//!
//! Folds records into independent straight-up, against-the-spread and
//! over/under buckets. A record missing the data one bucket needs is left
//! out of that bucket only, so bucket totals may differ.

use serde::{Deserialize, Serialize};
use trend_engine_core::{
    compute_significance, GameRecord, Perspective, Side, SignificanceResult, SpreadResult,
    TotalResult, ValidationError,
};

/// Outcome of one record within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Push,
}

/// Win/loss/push counts for one market.
///
/// For the over/under bucket `wins` counts overs and `losses` unders.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub total: u32,
    /// `100 * wins / (wins + losses)`; absent when nothing was decided.
    pub win_pct: Option<f64>,
}

impl Bucket {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Push => self.pushes += 1,
        }
        self.total += 1;
        self.win_pct = self.rate().map(|r| r * 100.0);
    }

    /// `wins / (wins + losses)` as a fraction.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses;
        (decided > 0).then(|| f64::from(self.wins) / f64::from(decided))
    }

    /// Decided sample size; pushes excluded.
    #[must_use]
    pub const fn decided(&self) -> u32 {
        self.wins + self.losses
    }

    /// The same bucket from the other side: wins and losses swap.
    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut out = Self {
            wins: self.losses,
            losses: self.wins,
            pushes: self.pushes,
            total: self.total,
            win_pct: None,
        };
        out.win_pct = out.rate().map(|r| r * 100.0);
        out
    }

    /// Significance of the win rate against `baseline`.
    ///
    /// # Errors
    /// Returns `InvalidBaseline` for a baseline outside (0, 1).
    pub fn significance(&self, baseline: f64) -> Result<SignificanceResult, ValidationError> {
        compute_significance(self.wins, self.losses, baseline)
    }
}

/// Which bucket a figure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Market {
    StraightUp,
    Ats,
    OverUnder,
}

/// Aggregated results of a filtered record set from one perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub perspective: Perspective,
    pub games: u32,
    pub straight_up: Bucket,
    pub ats: Bucket,
    pub over_under: Bucket,
    pub average_margin: Option<f64>,
    pub average_total_points: Option<f64>,
}

impl TrendSummary {
    #[must_use]
    pub const fn bucket(&self, market: Market) -> &Bucket {
        match market {
            Market::StraightUp => &self.straight_up,
            Market::Ats => &self.ats,
            Market::OverUnder => &self.over_under,
        }
    }

    /// Significance of one bucket against `baseline`.
    ///
    /// # Errors
    /// Returns `InvalidBaseline` for a baseline outside (0, 1).
    pub fn significance(
        &self,
        market: Market,
        baseline: f64,
    ) -> Result<SignificanceResult, ValidationError> {
        self.bucket(market).significance(baseline)
    }
}

/// Straight-up outcome for `side`; ties and unplayed games are `None`.
#[must_use]
pub fn straight_up_outcome(record: &GameRecord, side: Side) -> Option<Outcome> {
    if !record.is_final() {
        return None;
    }
    record
        .winner()
        .map(|w| if w == side { Outcome::Win } else { Outcome::Loss })
}

/// Against-the-spread outcome for `side` from the stored settlement.
#[must_use]
pub fn ats_outcome(record: &GameRecord, side: Side) -> Option<Outcome> {
    record.spread_result_for(side).map(|r| match r {
        SpreadResult::Covered => Outcome::Win,
        SpreadResult::Lost => Outcome::Loss,
        SpreadResult::Push => Outcome::Push,
    })
}

/// Over/under outcome, over counted as a win.
#[must_use]
pub fn total_outcome(record: &GameRecord) -> Option<Outcome> {
    record.total_result.map(|r| match r {
        TotalResult::Over => Outcome::Win,
        TotalResult::Under => Outcome::Loss,
        TotalResult::Push => Outcome::Push,
    })
}

/// Incremental fold over records.
#[derive(Debug, Clone)]
pub struct TrendAggregator {
    perspective: Perspective,
    games: u32,
    straight_up: Bucket,
    ats: Bucket,
    over_under: Bucket,
    margin_sum: i64,
    margin_count: u32,
    points_sum: u64,
    points_count: u32,
}

impl TrendAggregator {
    #[must_use]
    pub fn new(perspective: Perspective) -> Self {
        Self {
            perspective,
            games: 0,
            straight_up: Bucket::default(),
            ats: Bucket::default(),
            over_under: Bucket::default(),
            margin_sum: 0,
            margin_count: 0,
            points_sum: 0,
            points_count: 0,
        }
    }

    /// Adds one record seen from `side`.
    pub fn add(&mut self, record: &GameRecord, side: Side) {
        self.games += 1;
        if let Some(o) = straight_up_outcome(record, side) {
            self.straight_up.record(o);
        }
        if let Some(o) = ats_outcome(record, side) {
            self.ats.record(o);
        }
        if let Some(o) = total_outcome(record) {
            self.over_under.record(o);
        }
        if let Some(m) = record.margin_for(side) {
            self.margin_sum += m;
            self.margin_count += 1;
        }
        if let Some(p) = record.total_points() {
            self.points_sum += u64::from(p);
            self.points_count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn finish(self) -> TrendSummary {
        TrendSummary {
            perspective: self.perspective,
            games: self.games,
            straight_up: self.straight_up,
            ats: self.ats,
            over_under: self.over_under,
            average_margin: (self.margin_count > 0)
                .then(|| self.margin_sum as f64 / f64::from(self.margin_count)),
            average_total_points: (self.points_count > 0)
                .then(|| self.points_sum as f64 / f64::from(self.points_count)),
        }
    }
}

/// Aggregates `(record, side)` pairs into a summary.
pub fn summarize<'a>(
    perspective: Perspective,
    rows: impl IntoIterator<Item = (&'a GameRecord, Side)>,
) -> TrendSummary {
    let mut agg = TrendAggregator::new(perspective);
    for (record, side) in rows {
        agg.add(record, side);
    }
    agg.finish()
}
