//! Pick scoring engine.
//!
//! Combines situational angles into a signed trend score for one side of a
//! market, then assigns a star tier from the versioned rule table. Each
//! angle contributes `weight * direction * strength multiplier`; the
//! reasoning list carries those contributions in the order they were summed.

use serde::{Deserialize, Serialize};
use trend_engine_core::{GameRecord, RuleTable, ScoringConfig, TierInputs, ValidationError};
use trend_engine_trends::SituationalAngle;

use crate::pick::{Pick, PickResult, PickSide, PickType, ReasoningEntry};

/// What is being scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringContext {
    pub game_id: String,
    pub pick_type: PickType,
    /// Side to score; both sides are scored when absent.
    pub side: Option<PickSide>,
    /// Spread from the home side, or the total / prop number.
    pub line: Option<f64>,
    /// Player and stat for a prop.
    pub subject: Option<String>,
}

impl ScoringContext {
    #[must_use]
    pub fn new(game_id: impl Into<String>, pick_type: PickType) -> Self {
        Self {
            game_id: game_id.into(),
            pick_type,
            side: None,
            line: None,
            subject: None,
        }
    }

    /// Context for a spread or total pick on a scheduled game, using the
    /// game's own line.
    #[must_use]
    pub fn for_game(game: &GameRecord, pick_type: PickType) -> Self {
        let line = match pick_type {
            PickType::Spread => game.spread,
            PickType::OverUnder => game.total,
            PickType::PlayerProp => None,
        };
        Self {
            line,
            ..Self::new(game.id.clone(), pick_type)
        }
    }

    #[must_use]
    pub fn with_side(mut self, side: PickSide) -> Self {
        self.side = Some(side);
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: f64) -> Self {
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Line as seen from `side`: spreads flip sign for the away team.
    fn line_for(&self, side: PickSide) -> Option<f64> {
        match (self.pick_type, side) {
            (PickType::Spread, PickSide::Away) => self.line.map(|l| -l),
            _ => self.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoPickReason {
    /// No angle with a non-zero contribution for this market.
    NoRelevantAngles,
    /// Contributions cancel out.
    NoDirection,
    /// Score below the lowest tier's threshold.
    BelowThreshold,
    /// Score clears the lowest threshold but no tier's rules all match.
    FailedTierRules,
}

/// A scored game that did not produce a pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoPick {
    pub game_id: String,
    pub pick_type: PickType,
    pub side: Option<PickSide>,
    pub trend_score: f64,
    pub inputs: Option<TierInputs>,
    pub reason: NoPickReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum PickDecision {
    Pick(Pick),
    NoPick(NoPick),
}

impl PickDecision {
    #[must_use]
    pub fn pick(&self) -> Option<&Pick> {
        match self {
            Self::Pick(p) => Some(p),
            Self::NoPick(_) => None,
        }
    }

    #[must_use]
    pub fn into_pick(self) -> Option<Pick> {
        match self {
            Self::Pick(p) => Some(p),
            Self::NoPick(_) => None,
        }
    }
}

/// Reasoning and tier inputs for one side.
#[derive(Debug, Clone)]
struct SideScore {
    side: PickSide,
    reasoning: Vec<ReasoningEntry>,
    inputs: TierInputs,
}

/// Scores angles against a weight table and tier rules.
#[derive(Debug, Clone)]
pub struct PickScorer<'a> {
    scoring: &'a ScoringConfig,
    tiers: &'a RuleTable,
}

impl<'a> PickScorer<'a> {
    /// # Errors
    /// Returns `InvalidRuleTable` if the tier table is malformed.
    pub fn new(scoring: &'a ScoringConfig, tiers: &'a RuleTable) -> Result<Self, ValidationError> {
        tiers.validate()?;
        Ok(Self { scoring, tiers })
    }

    /// Scores `angles` for the context's market.
    #[must_use]
    pub fn score(&self, angles: &[SituationalAngle], ctx: &ScoringContext) -> PickDecision {
        let scored = match ctx.side {
            Some(side) => self.score_side(angles, side),
            None => {
                let [first, second] = ctx.pick_type.sides();
                let first = self.score_side(angles, first);
                if first.inputs.score < 0.0 {
                    self.score_side(angles, second)
                } else {
                    first
                }
            }
        };

        let inputs = scored.inputs;
        let reason = if scored.reasoning.is_empty() {
            Some(NoPickReason::NoRelevantAngles)
        } else if inputs.score == 0.0 && ctx.side.is_none() {
            Some(NoPickReason::NoDirection)
        } else if self
            .tiers
            .lowest_threshold()
            .map_or(true, |min| inputs.score < min)
        {
            Some(NoPickReason::BelowThreshold)
        } else {
            None
        };

        let stars = match reason {
            Some(_) => None,
            None => self.tiers.assign(&inputs),
        };
        let Some(stars) = stars else {
            let reason = reason.unwrap_or(NoPickReason::FailedTierRules);
            tracing::debug!(
                game = %ctx.game_id,
                side = %scored.side,
                score = inputs.score,
                ?reason,
                "no pick"
            );
            return PickDecision::NoPick(NoPick {
                game_id: ctx.game_id.clone(),
                pick_type: ctx.pick_type,
                side: (!scored.reasoning.is_empty()).then_some(scored.side),
                trend_score: inputs.score,
                inputs: (!scored.reasoning.is_empty()).then_some(inputs),
                reason,
            });
        };

        let line = ctx.line_for(scored.side);
        let headline = headline(ctx, scored.side, line, stars, &scored.reasoning);
        tracing::info!(
            game = %ctx.game_id,
            side = %scored.side,
            stars,
            score = inputs.score,
            edge = inputs.edge,
            table = %self.tiers.version,
            "pick emitted"
        );

        PickDecision::Pick(Pick {
            game_id: ctx.game_id.clone(),
            pick_type: ctx.pick_type,
            pick_side: scored.side,
            line,
            subject: ctx.subject.clone(),
            trend_score: inputs.score,
            confidence: stars,
            headline,
            reasoning: scored.reasoning,
            edge: inputs.edge,
            agreement: inputs.agreement,
            supporting: inputs.supporting,
            rule_table_version: self.tiers.version.clone(),
            result: PickResult::Pending,
        })
    }

    fn score_side(&self, angles: &[SituationalAngle], side: PickSide) -> SideScore {
        let baseline = self.scoring.baseline_rate;
        let mut rows: Vec<(ReasoningEntry, f64)> = angles
            .iter()
            .filter_map(|angle| {
                let direction = side.direction(angle.favors);
                let strength = angle.significance.strength;
                let weight = self.scoring.weight_for(&angle.weight_key);
                let contribution = weight * f64::from(direction) * strength.multiplier();
                if contribution == 0.0 {
                    return None;
                }
                let entry = ReasoningEntry {
                    angle_id: angle.id.clone(),
                    description: angle.description.clone(),
                    favors: angle.favors,
                    weight,
                    strength,
                    direction,
                    contribution,
                    wins: angle.record.wins,
                    losses: angle.record.losses,
                    pushes: angle.record.pushes,
                    p_value: angle.significance.p_value,
                };
                Some((entry, angle.rate.unwrap_or(baseline)))
            })
            .collect();

        rows.sort_by(|a, b| {
            b.0.contribution
                .abs()
                .total_cmp(&a.0.contribution.abs())
                .then_with(|| a.0.angle_id.cmp(&b.0.angle_id))
        });

        let score: f64 = rows.iter().map(|(e, _)| e.contribution).sum();
        let support: f64 = rows
            .iter()
            .map(|(e, _)| e.contribution)
            .filter(|c| *c > 0.0)
            .sum();
        let magnitude: f64 = rows.iter().map(|(e, _)| e.contribution.abs()).sum();
        let weighted_edge: f64 = rows
            .iter()
            .filter(|(e, _)| e.contribution > 0.0)
            .map(|(e, rate)| e.contribution * (rate - baseline))
            .sum();

        let inputs = TierInputs {
            score,
            edge: if support > 0.0 { weighted_edge / support } else { 0.0 },
            agreement: if magnitude > 0.0 { support / magnitude } else { 0.0 },
            supporting: rows.iter().filter(|(e, _)| e.contribution > 0.0).count(),
        };

        SideScore {
            side,
            reasoning: rows.into_iter().map(|(e, _)| e).collect(),
            inputs,
        }
    }
}

fn format_line(pick_type: PickType, line: f64) -> String {
    match pick_type {
        PickType::Spread if line > 0.0 => format!("+{line}"),
        PickType::Spread if line == 0.0 => "PK".to_string(),
        _ => format!("{line}"),
    }
}

fn headline(
    ctx: &ScoringContext,
    side: PickSide,
    line: Option<f64>,
    stars: u8,
    reasoning: &[ReasoningEntry],
) -> String {
    let mut out = format!("{stars}-star {side}");
    if let Some(line) = line {
        out.push(' ');
        out.push_str(&format_line(ctx.pick_type, line));
    }
    if let Some(subject) = &ctx.subject {
        out.push_str(&format!(" ({subject})"));
    }
    let supporting = reasoning.iter().filter(|r| r.direction > 0).count();
    out.push_str(&format!(
        ": {supporting} of {} angles agree",
        reasoning.len()
    ));
    if let Some(lead) = reasoning.first().filter(|r| r.direction > 0) {
        out.push_str(&format!(", led by {}", lead.description));
    }
    out
}

/// Scores `angles` for `ctx` with the given weights and tier table.
///
/// # Errors
/// Returns `InvalidRuleTable` if the tier table is malformed.
pub fn score_pick(
    angles: &[SituationalAngle],
    ctx: &ScoringContext,
    scoring: &ScoringConfig,
    tiers: &RuleTable,
) -> Result<PickDecision, ValidationError> {
    Ok(PickScorer::new(scoring, tiers)?.score(angles, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_engine_core::{compute_significance, Strength};
    use trend_engine_trends::{AngleMarket, Bucket, Favors};

    fn bucket(wins: u32, losses: u32) -> Bucket {
        let mut b = Bucket {
            wins,
            losses,
            pushes: 0,
            total: wins + losses,
            win_pct: None,
        };
        b.win_pct = b.rate().map(|r| r * 100.0);
        b
    }

    /// 30-10 strong, 15-5 moderate, 8-2 weak, 3-2 noise at a 0.5 baseline.
    fn angle(id: &str, favors: Favors, wins: u32, losses: u32, key: &str) -> SituationalAngle {
        let record = bucket(wins, losses);
        let market = match favors {
            Favors::Over | Favors::Under => AngleMarket::Total,
            _ => AngleMarket::Ats,
        };
        SituationalAngle {
            id: id.to_string(),
            description: format!("{id} angle"),
            market,
            favors,
            rate: record.rate(),
            sample_size: record.decided(),
            record,
            weight_key: key.to_string(),
            significance: compute_significance(wins, losses, 0.5).unwrap(),
        }
    }

    fn score(angles: &[SituationalAngle], ctx: &ScoringContext) -> PickDecision {
        score_pick(angles, ctx, &ScoringConfig::default(), &RuleTable::default()).unwrap()
    }

    fn spread_ctx() -> ScoringContext {
        ScoringContext::new("g1", PickType::Spread).with_line(-3.5)
    }

    // ============================================
    // Score and reasoning
    // ============================================

    #[test]
    fn fixture_strengths() {
        let strengths: Vec<_> = [(30, 10), (15, 5), (8, 2), (3, 2)]
            .iter()
            .map(|(w, l)| compute_significance(*w, *l, 0.5).unwrap().strength)
            .collect();
        assert_eq!(
            strengths,
            vec![Strength::Strong, Strength::Moderate, Strength::Weak, Strength::Noise]
        );
    }

    #[test]
    fn reasoning_resums_to_score() {
        let angles = vec![
            angle("venue", Favors::Home, 15, 5, "venue"),
            angle("line", Favors::Home, 30, 10, "line"),
            angle("form", Favors::Away, 8, 2, "form"),
            angle("rest", Favors::Home, 30, 10, "rest"),
        ];
        let pick = score(&angles, &spread_ctx()).into_pick().unwrap();

        let resum: f64 = pick.reasoning.iter().map(|r| r.contribution).sum();
        assert_eq!(resum, pick.trend_score);
        assert_eq!(pick.reasoning_total(), pick.trend_score);
        for entry in &pick.reasoning {
            assert!((entry.recompute() - entry.contribution).abs() < 1e-12);
        }
        // 1.2 + 1.0 + 0.8 * 0.7 - 0.7 * 0.4
        assert!((pick.trend_score - 2.48).abs() < 1e-9);
        let ids: Vec<_> = pick.reasoning.iter().map(|r| r.angle_id.as_str()).collect();
        assert_eq!(ids, vec!["line", "rest", "venue", "form"]);
    }

    #[test]
    fn tier_from_rule_table() {
        let angles = vec![
            angle("line", Favors::Home, 30, 10, "line"),
            angle("rest", Favors::Home, 30, 10, "rest"),
            angle("venue", Favors::Home, 15, 5, "venue"),
            angle("form", Favors::Away, 8, 2, "form"),
        ];
        let pick = score(&angles, &spread_ctx()).into_pick().unwrap();

        assert_eq!(pick.pick_side, PickSide::Home);
        assert_eq!(pick.confidence, 4);
        assert_eq!(pick.supporting, 3);
        assert!((pick.edge - 0.25).abs() < 1e-9);
        assert!((pick.agreement - 2.76 / 3.04).abs() < 1e-9);
        assert_eq!(pick.line, Some(-3.5));
        assert_eq!(pick.result, PickResult::Pending);
        assert_eq!(pick.rule_table_version, RuleTable::default().version);
        assert!(pick.headline.starts_with("4-star HOME -3.5"));
    }

    #[test]
    fn noise_contributes_nothing() {
        let angles = vec![
            angle("line", Favors::Home, 30, 10, "line"),
            angle("noise", Favors::Away, 3, 2, "rest"),
        ];
        let pick = score(&angles, &spread_ctx()).into_pick().unwrap();
        assert_eq!(pick.reasoning.len(), 1);
        assert!((pick.trend_score - 1.2).abs() < 1e-12);
    }

    // ============================================
    // Side selection
    // ============================================

    #[test]
    fn picks_the_side_with_positive_score() {
        let angles = vec![
            angle("line", Favors::Away, 30, 10, "line"),
            angle("rest", Favors::Away, 15, 5, "rest"),
        ];
        let pick = score(&angles, &spread_ctx()).into_pick().unwrap();
        assert_eq!(pick.pick_side, PickSide::Away);
        assert!(pick.trend_score > 0.0);
        assert_eq!(pick.line, Some(3.5));
        assert!(pick.reasoning.iter().all(|r| r.direction == 1));
        assert!(pick.headline.contains("AWAY +3.5"));
    }

    #[test]
    fn named_side_against_the_angles_is_no_pick() {
        let angles = vec![angle("line", Favors::Away, 30, 10, "line")];
        let ctx = spread_ctx().with_side(PickSide::Home);
        let PickDecision::NoPick(no) = score(&angles, &ctx) else {
            panic!("expected no pick");
        };
        assert_eq!(no.reason, NoPickReason::BelowThreshold);
        assert!(no.trend_score < 0.0);
    }

    #[test]
    fn cancelling_angles_have_no_direction() {
        let angles = vec![
            angle("a", Favors::Home, 30, 10, "rest"),
            angle("b", Favors::Away, 30, 10, "rest"),
        ];
        let PickDecision::NoPick(no) = score(&angles, &spread_ctx()) else {
            panic!("expected no pick");
        };
        assert_eq!(no.reason, NoPickReason::NoDirection);
    }

    #[test]
    fn totals_only_use_over_under_angles() {
        let angles = vec![
            angle("line", Favors::Home, 30, 10, "line"),
            angle("weather", Favors::Under, 30, 10, "weather"),
            angle("primetime", Favors::Under, 15, 5, "schedule"),
        ];
        let ctx = ScoringContext::new("g1", PickType::OverUnder).with_line(44.5);
        let pick = score(&angles, &ctx).into_pick().unwrap();
        assert_eq!(pick.pick_side, PickSide::Under);
        assert_eq!(pick.reasoning.len(), 2);
        assert_eq!(pick.line, Some(44.5));
    }

    // ============================================
    // No pick
    // ============================================

    #[test]
    fn below_lowest_threshold_is_never_tiered() {
        // 0.8 * 0.4 = 0.32, under the 0.4 floor
        let angles = vec![angle("short", Favors::Home, 8, 2, "schedule")];
        let PickDecision::NoPick(no) = score(&angles, &spread_ctx()) else {
            panic!("expected no pick");
        };
        assert_eq!(no.reason, NoPickReason::BelowThreshold);
        assert!((no.trend_score - 0.32).abs() < 1e-12);
    }

    #[test]
    fn no_angles_is_no_pick() {
        let PickDecision::NoPick(no) = score(&[], &spread_ctx()) else {
            panic!("expected no pick");
        };
        assert_eq!(no.reason, NoPickReason::NoRelevantAngles);
        assert_eq!(no.side, None);
    }

    #[test]
    fn failing_auxiliary_rules_is_no_pick() {
        // score 1.0 - 0.7 * 0.7 = 0.51 clears the floor, agreement 1.0 / 1.49 fails every tier
        let angles = vec![
            angle("rest", Favors::Home, 30, 10, "rest"),
            angle("form", Favors::Away, 15, 5, "form"),
        ];
        let tiers = RuleTable {
            version: "strict".to_string(),
            rules: vec![trend_engine_core::TierRule {
                stars: 1,
                min_score: 0.4,
                min_edge: 0.02,
                min_agreement: 0.9,
                min_supporting: 1,
            }],
        };
        let decision =
            score_pick(&angles, &spread_ctx(), &ScoringConfig::default(), &tiers).unwrap();
        let PickDecision::NoPick(no) = decision else {
            panic!("expected no pick");
        };
        assert_eq!(no.reason, NoPickReason::FailedTierRules);
        assert!(no.inputs.is_some());
    }

    #[test]
    fn invalid_table_is_rejected() {
        let mut tiers = RuleTable::default();
        tiers.rules.reverse();
        assert!(score_pick(&[], &spread_ctx(), &ScoringConfig::default(), &tiers).is_err());
    }

    #[test]
    fn prop_headline_names_subject() {
        let angles = vec![
            angle("a", Favors::Under, 30, 10, "line"),
            angle("b", Favors::Under, 30, 10, "rest"),
        ];
        let ctx = ScoringContext::new("g1", PickType::PlayerProp)
            .with_line(65.5)
            .with_subject("T. Kelce receiving yards");
        let pick = score(&angles, &ctx).into_pick().unwrap();
        assert_eq!(pick.pick_side, PickSide::Under);
        assert!(pick.headline.contains("UNDER 65.5 (T. Kelce receiving yards)"));
    }
}
