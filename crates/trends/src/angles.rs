//! Situational Angle Library.
//!
//! Each template is a named set of filters evaluated from one perspective.
//! For an upcoming game the library keeps the templates whose filters
//! describe that game, evaluates each over earlier games only, and reports
//! which side (or over/under) history favors.

use serde::{Deserialize, Serialize};
use trend_engine_core::{
    Field, Filter, GameRecord, Operator, Perspective, Side, SignificanceResult, SportConfig,
    ValidationError,
};

use crate::aggregator::{ats_outcome, total_outcome, Bucket};
use crate::evaluator::matches_all;
use crate::perspective::resolve_side;

/// Betting market an angle speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMarket {
    Ats,
    Total,
}

/// Outcome an angle points at in the upcoming game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Favors {
    Home,
    Away,
    Over,
    Under,
    Neutral,
}

impl From<Side> for Favors {
    fn from(side: Side) -> Self {
        match side {
            Side::Home => Self::Home,
            Side::Away => Self::Away,
        }
    }
}

/// A named filter set evaluated from one perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleTemplate {
    pub id: String,
    pub description: String,
    pub market: AngleMarket,
    pub perspective: Perspective,
    pub filters: Vec<Filter>,
    /// Key into the scoring weight table.
    pub weight_key: String,
}

impl AngleTemplate {
    fn new(
        id: &str,
        description: impl Into<String>,
        market: AngleMarket,
        perspective: Perspective,
        weight_key: &str,
        filters: Vec<Filter>,
    ) -> Self {
        Self {
            id: id.to_string(),
            description: description.into(),
            market,
            perspective,
            filters,
            weight_key: weight_key.to_string(),
        }
    }

    /// Side of `record` this template looks from, if its filters match.
    #[must_use]
    pub fn applies_to(&self, record: &GameRecord) -> Option<Side> {
        let side = resolve_side(record, self.perspective, None)?;
        matches_all(&self.filters, record, Some(side)).then_some(side)
    }
}

/// A template evaluated for one upcoming game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationalAngle {
    pub id: String,
    pub description: String,
    pub market: AngleMarket,
    pub favors: Favors,
    /// Historical record from the favored side (overs for a neutral total).
    pub record: Bucket,
    /// Win rate of the favored side, absent with no decided games.
    pub rate: Option<f64>,
    pub sample_size: u32,
    pub weight_key: String,
    pub significance: SignificanceResult,
}

/// The templates available for one sport.
#[derive(Debug, Clone)]
pub struct AngleCatalog {
    config: SportConfig,
    templates: Vec<AngleTemplate>,
}

fn eq(field: Field, value: bool) -> Result<Filter, ValidationError> {
    Filter::equals(field, value)
}

fn cmp(field: Field, operator: Operator, value: f64) -> Result<Filter, ValidationError> {
    Filter::compare(field, operator, value)
}

impl AngleCatalog {
    /// Builds the catalog from a sport's parameters.
    ///
    /// # Errors
    /// Returns a validation error if a template filter is malformed.
    pub fn for_sport(config: &SportConfig) -> Result<Self, ValidationError> {
        use AngleMarket::{Ats, Total};
        use Perspective::{Away, Favorite, Home, Underdog};

        let c = config;
        let mut t = vec![
            AngleTemplate::new(
                "home_favorite",
                "Home favorites",
                Ats,
                Favorite,
                "line",
                vec![eq(Field::IsHome, true)?],
            ),
            AngleTemplate::new(
                "road_underdog",
                "Road underdogs",
                Ats,
                Underdog,
                "line",
                vec![eq(Field::IsHome, false)?],
            ),
            AngleTemplate::new(
                "big_home_favorite",
                format!("Home favorites of {} or more", c.big_favorite_spread),
                Ats,
                Favorite,
                "line",
                vec![
                    eq(Field::IsHome, true)?,
                    cmp(Field::Spread, Operator::Lte, -c.big_favorite_spread)?,
                ],
            ),
            AngleTemplate::new(
                "division_underdog",
                "Underdogs in division games",
                Ats,
                Underdog,
                "schedule",
                vec![eq(Field::IsDivisionGame, true)?],
            ),
            AngleTemplate::new(
                "conference_home",
                "Home teams in conference games",
                Ats,
                Home,
                "schedule",
                vec![eq(Field::IsConferenceGame, true)?],
            ),
            AngleTemplate::new(
                "playoff_underdog",
                "Playoff underdogs",
                Ats,
                Underdog,
                "schedule",
                vec![eq(Field::IsPlayoff, true)?],
            ),
            AngleTemplate::new(
                "primetime_home",
                "Home teams in primetime",
                Ats,
                Home,
                "venue",
                vec![eq(Field::IsPrimetime, true)?],
            ),
            AngleTemplate::new(
                "primetime_total",
                "Primetime totals",
                Total,
                Home,
                "venue",
                vec![eq(Field::IsPrimetime, true)?],
            ),
            AngleTemplate::new(
                "neutral_site_favorite",
                "Favorites at neutral sites",
                Ats,
                Favorite,
                "venue",
                vec![eq(Field::IsNeutralSite, true)?],
            ),
            AngleTemplate::new(
                "high_total",
                format!("Totals of {} or more", c.high_total),
                Total,
                Home,
                "line",
                vec![cmp(Field::Total, Operator::Gte, c.high_total)?],
            ),
            AngleTemplate::new(
                "home_rest_advantage",
                "Home teams with at least two more days of rest",
                Ats,
                Home,
                "rest",
                vec![cmp(Field::RestAdvantage, Operator::Gte, 2.0)?],
            ),
            AngleTemplate::new(
                "away_rest_advantage",
                "Road teams with at least two more days of rest",
                Ats,
                Away,
                "rest",
                vec![cmp(Field::RestAdvantage, Operator::Gte, 2.0)?],
            ),
            AngleTemplate::new(
                "home_short_rest",
                format!("Home teams on {} or fewer days of rest", c.short_rest_days),
                Ats,
                Home,
                "rest",
                vec![cmp(Field::RestDays, Operator::Lte, f64::from(c.short_rest_days))?],
            ),
            AngleTemplate::new(
                "away_short_rest",
                format!("Road teams on {} or fewer days of rest", c.short_rest_days),
                Ats,
                Away,
                "rest",
                vec![cmp(Field::RestDays, Operator::Lte, f64::from(c.short_rest_days))?],
            ),
            AngleTemplate::new(
                "higher_rated_underdog",
                "Underdogs with the higher rating",
                Ats,
                Underdog,
                "rating",
                vec![cmp(Field::RatingDiff, Operator::Gt, 0.0)?],
            ),
        ];

        let streak = f64::from(c.streak_length);
        for (perspective, label) in [(Home, "Home"), (Away, "Road")] {
            let key = if perspective == Home { "home" } else { "away" };
            t.push(AngleTemplate::new(
                &format!("{key}_win_streak"),
                format!("{label} teams on a {}+ game win streak", c.streak_length),
                Ats,
                perspective,
                "form",
                vec![cmp(Field::Streak, Operator::Gte, streak)?],
            ));
            t.push(AngleTemplate::new(
                &format!("{key}_losing_streak"),
                format!("{label} teams on a {}+ game losing streak", c.streak_length),
                Ats,
                perspective,
                "form",
                vec![cmp(Field::Streak, Operator::Lte, -streak)?],
            ));
        }

        if let Some(bye) = c.bye_rest_days {
            t.push(AngleTemplate::new(
                "home_off_bye",
                "Home teams off a bye",
                Ats,
                Home,
                "rest",
                vec![cmp(Field::RestDays, Operator::Gte, f64::from(bye))?],
            ));
            t.push(AngleTemplate::new(
                "away_off_bye",
                "Road teams off a bye",
                Ats,
                Away,
                "rest",
                vec![cmp(Field::RestDays, Operator::Gte, f64::from(bye))?],
            ));
        }

        if c.outdoor {
            t.push(AngleTemplate::new(
                "cold_weather_total",
                format!("Outdoor games at {} degrees or colder", c.cold_temperature),
                Total,
                Home,
                "weather",
                vec![
                    eq(Field::IsDome, false)?,
                    cmp(Field::Temperature, Operator::Lte, c.cold_temperature)?,
                ],
            ));
            t.push(AngleTemplate::new(
                "windy_total",
                format!("Outdoor games with wind of {} mph or more", c.high_wind),
                Total,
                Home,
                "weather",
                vec![
                    eq(Field::IsDome, false)?,
                    cmp(Field::WindSpeed, Operator::Gte, c.high_wind)?,
                ],
            ));
        }

        if c.uses_rankings {
            t.push(AngleTemplate::new(
                "ranked_home_vs_unranked",
                "Ranked home teams against unranked opponents",
                Ats,
                Home,
                "ranking",
                vec![eq(Field::IsRanked, true)?, eq(Field::OpponentIsRanked, false)?],
            ));
            t.push(AngleTemplate::new(
                "unranked_underdog_vs_ranked",
                "Unranked underdogs against ranked opponents",
                Ats,
                Underdog,
                "ranking",
                vec![eq(Field::IsRanked, false)?, eq(Field::OpponentIsRanked, true)?],
            ));
        }

        Ok(Self {
            config: config.clone(),
            templates: t,
        })
    }

    #[must_use]
    pub fn templates(&self) -> &[AngleTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn config(&self) -> &SportConfig {
        &self.config
    }

    /// Evaluates every applicable template for `upcoming`.
    ///
    /// # Errors
    /// Returns `InvalidBaseline` for a baseline outside (0, 1).
    pub fn angles_for(
        &self,
        upcoming: &GameRecord,
        history: &[GameRecord],
        baseline: f64,
    ) -> Result<Vec<SituationalAngle>, ValidationError> {
        let mut angles = Vec::new();
        for template in &self.templates {
            if let Some(angle) = evaluate_angle(template, upcoming, history, baseline)? {
                angles.push(angle);
            }
        }
        tracing::debug!(
            game = %upcoming.id,
            templates = self.templates.len(),
            applicable = angles.len(),
            "evaluated situational angles"
        );
        Ok(angles)
    }
}

/// Evaluates one template for `upcoming`, or `None` if it does not apply.
///
/// Only history of the same sport dated strictly before the upcoming game
/// is used.
///
/// # Errors
/// Returns `InvalidBaseline` for a baseline outside (0, 1).
pub fn evaluate_angle(
    template: &AngleTemplate,
    upcoming: &GameRecord,
    history: &[GameRecord],
    baseline: f64,
) -> Result<Option<SituationalAngle>, ValidationError> {
    let Some(upcoming_side) = template.applies_to(upcoming) else {
        return Ok(None);
    };

    let mut bucket = Bucket::default();
    for record in history
        .iter()
        .filter(|r| r.sport == upcoming.sport && r.date < upcoming.date)
    {
        let Some(side) = template.applies_to(record) else {
            continue;
        };
        let outcome = match template.market {
            AngleMarket::Ats => ats_outcome(record, side),
            AngleMarket::Total => total_outcome(record),
        };
        if let Some(o) = outcome {
            bucket.record(o);
        }
    }

    let rate = bucket.rate();
    let (favors, record) = match (template.market, rate) {
        (AngleMarket::Ats, Some(r)) if r > baseline => (Favors::from(upcoming_side), bucket),
        (AngleMarket::Ats, Some(r)) if r < baseline => {
            (Favors::from(upcoming_side.opposite()), bucket.flipped())
        }
        (AngleMarket::Total, Some(r)) if r > baseline => (Favors::Over, bucket),
        (AngleMarket::Total, Some(r)) if r < baseline => (Favors::Under, bucket.flipped()),
        _ => (Favors::Neutral, bucket),
    };

    let significance = record.significance(baseline)?;
    Ok(Some(SituationalAngle {
        id: template.id.clone(),
        description: template.description.clone(),
        market: template.market,
        favors,
        rate: record.rate(),
        sample_size: record.decided(),
        record,
        weight_key: template.weight_key.clone(),
        significance,
    }))
}

/// Builds the catalog for `config` and evaluates it for `upcoming`.
///
/// # Errors
/// Returns a validation error for a malformed template or invalid baseline.
pub fn angles_for(
    upcoming: &GameRecord,
    history: &[GameRecord],
    config: &SportConfig,
    baseline: f64,
) -> Result<Vec<SituationalAngle>, ValidationError> {
    AngleCatalog::for_sport(config)?.angles_for(upcoming, history, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashSet;
    use trend_engine_core::{Sport, SpreadResult, Strength, TotalResult};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, 1).unwrap()
    }

    fn past(i: i64, home_covered: bool) -> GameRecord {
        let mut g = GameRecord::scheduled(
            format!("p{i}"),
            Sport::Nfl,
            2020,
            start() + Duration::days(i),
            "HOME",
            "AWAY",
        );
        g.spread = Some(3.0);
        g.total = Some(44.0);
        g.home_score = Some(20);
        g.away_score = Some(17);
        g.spread_result = Some(if home_covered {
            SpreadResult::Covered
        } else {
            SpreadResult::Lost
        });
        g.total_result = Some(if i % 3 == 0 {
            TotalResult::Over
        } else {
            TotalResult::Under
        });
        g
    }

    fn upcoming(days: i64) -> GameRecord {
        let mut g = GameRecord::scheduled(
            "next",
            Sport::Nfl,
            2021,
            start() + Duration::days(days),
            "HOME",
            "AWAY",
        );
        g.spread = Some(3.0);
        g.total = Some(44.0);
        g
    }

    fn template(perspective: Perspective) -> AngleTemplate {
        AngleTemplate::new("t", "test", AngleMarket::Ats, perspective, "line", vec![])
    }

    #[test]
    fn catalog_ids_are_unique() {
        for sport in Sport::ALL {
            let catalog = AngleCatalog::for_sport(&SportConfig::for_sport(sport)).unwrap();
            let ids: HashSet<_> = catalog.templates().iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids.len(), catalog.templates().len(), "{sport}");
        }
    }

    #[test]
    fn sport_config_shapes_catalog() {
        let nfl = AngleCatalog::for_sport(&SportConfig::for_sport(Sport::Nfl)).unwrap();
        let nba = AngleCatalog::for_sport(&SportConfig::for_sport(Sport::Nba)).unwrap();
        let ncaaf = AngleCatalog::for_sport(&SportConfig::for_sport(Sport::Ncaaf)).unwrap();
        let has = |c: &AngleCatalog, id: &str| c.templates().iter().any(|t| t.id == id);

        assert!(has(&nfl, "home_off_bye"));
        assert!(has(&nfl, "windy_total"));
        assert!(!has(&nba, "home_off_bye"));
        assert!(!has(&nba, "cold_weather_total"));
        assert!(has(&ncaaf, "ranked_home_vs_unranked"));
        assert!(!has(&nfl, "ranked_home_vs_unranked"));
    }

    #[test]
    fn favors_the_side_history_supports() {
        // home underdogs covered 30 of 40
        let history: Vec<_> = (0..40).map(|i| past(i, i % 4 != 0)).collect();
        let angle = evaluate_angle(&template(Perspective::Underdog), &upcoming(100), &history, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(angle.favors, Favors::Home);
        assert_eq!((angle.record.wins, angle.record.losses), (30, 10));
        assert_eq!(angle.sample_size, 40);
        assert!((angle.rate.unwrap() - 0.75).abs() < 1e-9);
        assert_eq!(angle.significance.strength, Strength::Strong);
    }

    #[test]
    fn losing_perspective_favors_the_other_side() {
        // favorites (away) covered 10 of 40, so the angle favors home
        let history: Vec<_> = (0..40).map(|i| past(i, i % 4 != 0)).collect();
        let angle = evaluate_angle(&template(Perspective::Favorite), &upcoming(100), &history, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(angle.favors, Favors::Home);
        assert_eq!((angle.record.wins, angle.record.losses), (30, 10));
    }

    #[test]
    fn only_earlier_games_count() {
        let history: Vec<_> = (0..40).map(|i| past(i, true)).collect();
        let angle = evaluate_angle(&template(Perspective::Home), &upcoming(10), &history, 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(angle.sample_size, 10);
    }

    #[test]
    fn totals_favor_over_or_under() {
        let history: Vec<_> = (0..30).map(|i| past(i, true)).collect();
        let t = AngleTemplate::new("tot", "totals", AngleMarket::Total, Perspective::Home, "line", vec![]);
        let angle = evaluate_angle(&t, &upcoming(100), &history, 0.5).unwrap().unwrap();
        assert_eq!(angle.favors, Favors::Under);
        assert_eq!((angle.record.wins, angle.record.losses), (20, 10));
    }

    #[test]
    fn no_history_is_neutral_noise() {
        let angle = evaluate_angle(&template(Perspective::Home), &upcoming(1), &[], 0.5)
            .unwrap()
            .unwrap();
        assert_eq!(angle.favors, Favors::Neutral);
        assert_eq!(angle.significance.strength, Strength::Noise);
        assert_eq!(angle.rate, None);
    }

    #[test]
    fn inapplicable_template_is_skipped() {
        let t = AngleTemplate::new(
            "playoffs",
            "playoffs",
            AngleMarket::Ats,
            Perspective::Home,
            "schedule",
            vec![Filter::equals(Field::IsPlayoff, true).unwrap()],
        );
        assert!(evaluate_angle(&t, &upcoming(100), &[], 0.5).unwrap().is_none());

        let mut pickem = upcoming(100);
        pickem.spread = Some(0.0);
        assert!(evaluate_angle(&template(Perspective::Favorite), &pickem, &[], 0.5)
            .unwrap()
            .is_none());
    }

    #[test]
    fn angles_for_runs_the_catalog() {
        let history: Vec<_> = (0..40)
            .map(|i| {
                let mut g = past(i, i % 4 != 0);
                g.is_division_game = true;
                g
            })
            .collect();
        let mut next = upcoming(100);
        next.is_division_game = true;

        let angles = angles_for(&next, &history, &SportConfig::for_sport(Sport::Nfl), 0.5).unwrap();
        let ids: Vec<_> = angles.iter().map(|a| a.id.as_str()).collect();

        // home is the underdog, so road-underdog and home-favorite angles do not apply
        assert!(!ids.contains(&"road_underdog"));
        assert!(!ids.contains(&"home_favorite"));

        let division = angles.iter().find(|a| a.id == "division_underdog").unwrap();
        assert_eq!(division.favors, Favors::Home);
        assert_eq!(division.weight_key, "schedule");
        assert_eq!(division.sample_size, 40);
    }
}
