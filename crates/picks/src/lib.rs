//! Pick scoring, grading and confidence-tier backtests.

pub mod backtest;
pub mod pick;
pub mod scoring;

pub use backtest::{
    backtest_picks, replay, validate_holdout, HistoricalSample, HoldoutValidation,
    MonotonicityViolation, TierBacktest, TierReport,
};
pub use pick::{Pick, PickResult, PickSide, PickType, ReasoningEntry};
pub use scoring::{score_pick, NoPick, NoPickReason, PickDecision, PickScorer, ScoringContext};
