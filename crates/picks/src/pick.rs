//! Pick model and the grading state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use trend_engine_core::{EngineError, GameRecord, Side, Strength, ValidationError};
use trend_engine_trends::Favors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickType {
    Spread,
    OverUnder,
    PlayerProp,
}

impl PickType {
    /// Sides a pick of this type can take.
    #[must_use]
    pub const fn sides(self) -> [PickSide; 2] {
        match self {
            Self::Spread => [PickSide::Home, PickSide::Away],
            Self::OverUnder | Self::PlayerProp => [PickSide::Over, PickSide::Under],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickSide {
    Home,
    Away,
    Over,
    Under,
}

impl PickSide {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
            Self::Over => Self::Under,
            Self::Under => Self::Over,
        }
    }

    /// +1 if the angle points at this side, -1 if at the other, 0 otherwise.
    #[must_use]
    pub fn direction(self, favors: Favors) -> i8 {
        let same = match (self, favors) {
            (Self::Home, Favors::Home)
            | (Self::Away, Favors::Away)
            | (Self::Over, Favors::Over)
            | (Self::Under, Favors::Under) => Some(true),
            (Self::Home | Self::Away, Favors::Home | Favors::Away)
            | (Self::Over | Self::Under, Favors::Over | Favors::Under) => Some(false),
            _ => None,
        };
        match same {
            Some(true) => 1,
            Some(false) => -1,
            None => 0,
        }
    }

    const fn game_side(self) -> Option<Side> {
        match self {
            Self::Home => Some(Side::Home),
            Self::Away => Some(Side::Away),
            Self::Over | Self::Under => None,
        }
    }
}

impl fmt::Display for PickSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Home => "HOME",
            Self::Away => "AWAY",
            Self::Over => "OVER",
            Self::Under => "UNDER",
        };
        f.write_str(s)
    }
}

/// Settlement state. `Pending` moves to one of the others exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickResult {
    Pending,
    Win,
    Loss,
    Push,
}

impl fmt::Display for PickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Win => "WIN",
            Self::Loss => "LOSS",
            Self::Push => "PUSH",
        };
        f.write_str(s)
    }
}

/// One angle's share of a trend score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningEntry {
    pub angle_id: String,
    pub description: String,
    pub favors: Favors,
    pub weight: f64,
    pub strength: Strength,
    /// +1 supports the pick, -1 opposes it.
    pub direction: i8,
    /// `weight * direction * strength.multiplier()`
    pub contribution: f64,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub p_value: f64,
}

impl ReasoningEntry {
    /// Recomputes the contribution from weight, direction and strength.
    #[must_use]
    pub fn recompute(&self) -> f64 {
        self.weight * f64::from(self.direction) * self.strength.multiplier()
    }
}

/// A scored, tiered recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub game_id: String,
    pub pick_type: PickType,
    pub pick_side: PickSide,
    /// Line from the picked side (spread) or the total/prop number.
    pub line: Option<f64>,
    /// Player or market a prop pick is about.
    pub subject: Option<String>,
    pub trend_score: f64,
    /// Star tier, 1 or more.
    pub confidence: u8,
    pub headline: String,
    pub reasoning: Vec<ReasoningEntry>,
    pub edge: f64,
    pub agreement: f64,
    pub supporting: usize,
    pub rule_table_version: String,
    pub result: PickResult,
}

impl Pick {
    /// Sum of the reasoning contributions in order.
    #[must_use]
    pub fn reasoning_total(&self) -> f64 {
        self.reasoning.iter().map(|r| r.contribution).sum()
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.result != PickResult::Pending
    }

    /// Moves a pending pick to a final result.
    ///
    /// # Errors
    /// `AlreadyGraded` if the pick was settled before; a validation error
    /// if `result` is `Pending`.
    pub fn grade(&mut self, result: PickResult) -> Result<(), EngineError> {
        if self.is_graded() {
            return Err(EngineError::AlreadyGraded {
                game_id: self.game_id.clone(),
                result: self.result.to_string(),
            });
        }
        if result == PickResult::Pending {
            return Err(ValidationError::InvalidQuery(
                "a pick can only be graded to WIN, LOSS or PUSH".to_string(),
            )
            .into());
        }
        self.result = result;
        tracing::info!(game = %self.game_id, result = %result, stars = self.confidence, "graded pick");
        Ok(())
    }

    /// Settles a spread or total pick from the final game record.
    ///
    /// Returns `Pending` and leaves the pick untouched while the game is
    /// unfinished.
    ///
    /// # Errors
    /// `AlreadyGraded` for a settled pick; a validation error for a prop
    /// pick, a pick without a line, or a record for another game.
    #[allow(clippy::cast_precision_loss)]
    pub fn grade_from_game(&mut self, game: &GameRecord) -> Result<PickResult, EngineError> {
        if self.is_graded() {
            return Err(EngineError::AlreadyGraded {
                game_id: self.game_id.clone(),
                result: self.result.to_string(),
            });
        }
        if game.id != self.game_id {
            return Err(ValidationError::InvalidQuery(format!(
                "record {} does not belong to pick for game {}",
                game.id, self.game_id
            ))
            .into());
        }
        let line = self.line.ok_or_else(|| {
            ValidationError::InvalidQuery(format!("pick for game {} has no line", self.game_id))
        })?;
        if !game.is_final() {
            return Ok(PickResult::Pending);
        }

        let result = match (self.pick_type, self.pick_side.game_side()) {
            (PickType::Spread, Some(side)) => {
                let margin = game.margin_for(side).map(|m| m as f64);
                margin.map(|m| settle(m + line))
            }
            (PickType::OverUnder, None) => game.total_points().map(|p| {
                let diff = f64::from(p) - line;
                if self.pick_side == PickSide::Over {
                    settle(diff)
                } else {
                    settle(-diff)
                }
            }),
            _ => {
                return Err(ValidationError::InvalidQuery(format!(
                    "{:?} pick on {} cannot be graded from a game record",
                    self.pick_type, self.pick_side
                ))
                .into())
            }
        };

        let result = result.unwrap_or(PickResult::Pending);
        if result != PickResult::Pending {
            self.grade(result)?;
        }
        Ok(result)
    }

    /// Settles a player prop from the stat the player recorded.
    ///
    /// # Errors
    /// `AlreadyGraded` for a settled pick; a validation error for a
    /// non-prop pick or a pick without a line.
    pub fn grade_prop(&mut self, actual: f64) -> Result<PickResult, EngineError> {
        if self.pick_type != PickType::PlayerProp {
            return Err(ValidationError::InvalidQuery(
                "only player props are graded from a stat value".to_string(),
            )
            .into());
        }
        let line = self.line.ok_or_else(|| {
            ValidationError::InvalidQuery(format!("pick for game {} has no line", self.game_id))
        })?;
        let diff = actual - line;
        let result = if self.pick_side == PickSide::Over {
            settle(diff)
        } else {
            settle(-diff)
        };
        self.grade(result)?;
        Ok(result)
    }
}

fn settle(diff: f64) -> PickResult {
    if diff > 0.0 {
        PickResult::Win
    } else if diff < 0.0 {
        PickResult::Loss
    } else {
        PickResult::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trend_engine_core::Sport;

    fn pick(pick_type: PickType, side: PickSide, line: Option<f64>) -> Pick {
        Pick {
            game_id: "g1".to_string(),
            pick_type,
            pick_side: side,
            line,
            subject: None,
            trend_score: 1.0,
            confidence: 2,
            headline: String::new(),
            reasoning: vec![],
            edge: 0.05,
            agreement: 1.0,
            supporting: 2,
            rule_table_version: "test".to_string(),
            result: PickResult::Pending,
        }
    }

    fn final_game(home: u32, away: u32) -> GameRecord {
        let mut g = GameRecord::scheduled(
            "g1",
            Sport::Nfl,
            2023,
            NaiveDate::from_ymd_opt(2023, 9, 10).unwrap(),
            "KC",
            "DET",
        );
        g.home_score = Some(home);
        g.away_score = Some(away);
        g
    }

    #[test]
    fn direction_signs() {
        assert_eq!(PickSide::Home.direction(Favors::Home), 1);
        assert_eq!(PickSide::Home.direction(Favors::Away), -1);
        assert_eq!(PickSide::Over.direction(Favors::Under), -1);
        assert_eq!(PickSide::Home.direction(Favors::Over), 0);
        assert_eq!(PickSide::Under.direction(Favors::Neutral), 0);
    }

    #[test]
    fn grading_is_one_way() {
        let mut p = pick(PickType::Spread, PickSide::Home, Some(-3.0));
        p.grade(PickResult::Win).unwrap();
        assert_eq!(p.result, PickResult::Win);

        let err = p.grade(PickResult::Loss).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyGraded { .. }));
        assert_eq!(p.result, PickResult::Win);
    }

    #[test]
    fn cannot_grade_to_pending() {
        let mut p = pick(PickType::Spread, PickSide::Home, Some(-3.0));
        assert!(p.grade(PickResult::Pending).unwrap_err().is_validation());
    }

    #[test]
    fn spread_pick_settles_from_margin() {
        // home -3 wins by 3: push
        let mut p = pick(PickType::Spread, PickSide::Home, Some(-3.0));
        assert_eq!(p.grade_from_game(&final_game(27, 24)).unwrap(), PickResult::Push);

        // away +3.5 loses by 3: win
        let mut p = pick(PickType::Spread, PickSide::Away, Some(3.5));
        assert_eq!(p.grade_from_game(&final_game(27, 24)).unwrap(), PickResult::Win);
    }

    #[test]
    fn total_pick_settles_from_points() {
        let mut over = pick(PickType::OverUnder, PickSide::Over, Some(47.5));
        assert_eq!(over.grade_from_game(&final_game(27, 24)).unwrap(), PickResult::Win);
        let mut under = pick(PickType::OverUnder, PickSide::Under, Some(47.5));
        assert_eq!(under.grade_from_game(&final_game(20, 17)).unwrap(), PickResult::Win);
    }

    #[test]
    fn unfinished_game_stays_pending() {
        let mut p = pick(PickType::Spread, PickSide::Home, Some(-3.0));
        let mut g = final_game(0, 0);
        g.home_score = None;
        assert_eq!(p.grade_from_game(&g).unwrap(), PickResult::Pending);
        assert!(!p.is_graded());
    }

    #[test]
    fn wrong_game_is_rejected() {
        let mut p = pick(PickType::Spread, PickSide::Home, Some(-3.0));
        let mut g = final_game(10, 3);
        g.id = "other".to_string();
        assert!(p.grade_from_game(&g).is_err());
    }

    #[test]
    fn prop_grading() {
        let mut p = pick(PickType::PlayerProp, PickSide::Under, Some(65.5));
        assert_eq!(p.grade_prop(48.0).unwrap(), PickResult::Win);
        assert!(p.grade_prop(80.0).is_err());

        let mut spread = pick(PickType::Spread, PickSide::Home, Some(-1.0));
        assert!(spread.grade_prop(3.0).is_err());
    }

    #[test]
    fn reasoning_recompute_matches_contribution() {
        let entry = ReasoningEntry {
            angle_id: "a".to_string(),
            description: String::new(),
            favors: Favors::Home,
            weight: 1.2,
            strength: Strength::Moderate,
            direction: -1,
            contribution: -1.2 * 0.7,
            wins: 20,
            losses: 8,
            pushes: 0,
            p_value: 0.02,
        };
        assert!((entry.recompute() - entry.contribution).abs() < f64::EPSILON);
    }
}
