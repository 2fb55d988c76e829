//! Filter Evaluator.
//!
//! Resolves whitelisted fields on a record from a side's point of view and
//! applies filter operators. Resolution is an exhaustive match over
//! [`Field`], so the whitelist and this table cannot drift apart.

use chrono::NaiveDate;
use std::borrow::Cow;
use trend_engine_core::{
    field::check_whitelist, Field, FieldKind, Filter, FilterValue, GameRecord, Operator, Scalar,
    Side, Sport, SpreadResult, TotalResult, ValidationError,
};

const EPSILON: f64 = 1e-9;

/// A resolved field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Bool(bool),
    Text(Cow<'a, str>),
}

impl FieldValue<'_> {
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Number(_) => FieldKind::Numeric,
            Self::Bool(_) => FieldKind::Boolean,
            Self::Text(_) => FieldKind::Text,
        }
    }

    fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Self::Number(a), Scalar::Number(b)) => (a - b).abs() < EPSILON,
            (Self::Bool(a), Scalar::Bool(b)) => a == b,
            (Self::Text(a), Scalar::Text(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }

    const fn number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn num<T: Into<f64>>(v: Option<T>) -> Option<FieldValue<'static>> {
    v.map(|n| FieldValue::Number(n.into()))
}

#[allow(clippy::cast_precision_loss)]
fn int(v: Option<i64>) -> Option<FieldValue<'static>> {
    v.map(|n| FieldValue::Number(n as f64))
}

fn flag(v: bool) -> Option<FieldValue<'static>> {
    Some(FieldValue::Bool(v))
}

fn text(v: &str) -> Option<FieldValue<'_>> {
    Some(FieldValue::Text(Cow::Borrowed(v)))
}

fn diff<T: Into<f64>>(a: Option<T>, b: Option<T>) -> Option<FieldValue<'static>> {
    Some(FieldValue::Number(a?.into() - b?.into()))
}

/// Resolves `field` on `record` from `side`'s point of view.
///
/// Returns `None` when the value is absent on the record, or when the field
/// is side-relative and no side could be resolved.
#[must_use]
pub fn resolve(field: Field, record: &GameRecord, side: Option<Side>) -> Option<FieldValue<'_>> {
    if field.is_side_relative() && side.is_none() {
        return None;
    }
    let us = side.unwrap_or(Side::Home);
    let them = us.opposite();

    match field {
        Field::Season => num(Some(record.season)),
        Field::Week => num(record.week),
        Field::Month => num(Some(record.month())),
        Field::DayOfWeek => text(record.day_of_week()),
        Field::Team => text(record.team(us)),
        Field::Opponent => text(record.team(them)),
        Field::HomeTeam => text(&record.home_team),
        Field::AwayTeam => text(&record.away_team),
        Field::IsHome => flag(us == Side::Home),
        Field::IsFavorite => record.spread.map(|_| FieldValue::Bool(record.favorite() == Some(us))),
        Field::IsUnderdog => record.spread.map(|_| FieldValue::Bool(record.favorite() == Some(them))),
        Field::Spread => num(record.spread_for(us)),
        Field::Total => num(record.total),
        Field::Moneyline => num(record.moneyline(us)),
        Field::Points => num(record.score(us)),
        Field::OpponentPoints => num(record.score(them)),
        Field::Margin => int(record.margin_for(us)),
        Field::TotalPoints => num(record.total_points()),
        Field::RestDays => num(record.rest_days(us)),
        Field::OpponentRestDays => num(record.rest_days(them)),
        Field::RestAdvantage => int(
            record
                .rest_days(us)
                .zip(record.rest_days(them))
                .map(|(a, b)| i64::from(a) - i64::from(b)),
        ),
        Field::Rating => num(record.rating(us)),
        Field::OpponentRating => num(record.rating(them)),
        Field::RatingDiff => diff(record.rating(us), record.rating(them)),
        Field::Rank => num(record.rank(us)),
        Field::OpponentRank => num(record.rank(them)),
        Field::IsRanked => flag(record.rank(us).is_some()),
        Field::OpponentIsRanked => flag(record.rank(them).is_some()),
        Field::Streak => num(record.streak(us)),
        Field::OpponentStreak => num(record.streak(them)),
        Field::IsConferenceGame => flag(record.is_conference_game),
        Field::IsDivisionGame => flag(record.is_division_game),
        Field::IsPlayoff => flag(record.is_playoff),
        Field::IsNeutralSite => flag(record.is_neutral_site),
        Field::IsPrimetime => flag(record.is_primetime),
        Field::IsDome => flag(record.is_dome),
        Field::Temperature => num(record.temperature),
        Field::WindSpeed => num(record.wind_speed),
        Field::WeatherCondition => record.weather_condition.as_deref().and_then(text),
    }
}

/// Applies one filter to a record.
///
/// An absent value fails every operator except `neq null`, including `neq`
/// against a concrete value. `eq null` never matches and `neq null` always
/// does, present or absent.
#[must_use]
pub fn matches(filter: &Filter, record: &GameRecord, side: Option<Side>) -> bool {
    let op = filter.operator();

    if let FilterValue::Null = filter.value() {
        return matches!(op, Operator::Neq);
    }

    let Some(value) = resolve(filter.field(), record, side) else {
        return false;
    };

    match (op, filter.value()) {
        (Operator::Eq, FilterValue::Scalar(s)) => value.equals(s),
        (Operator::Neq, FilterValue::Scalar(s)) => !value.equals(s),
        (Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte, FilterValue::Scalar(s)) => {
            match (value.number(), s.as_number()) {
                (Some(a), Some(b)) => match op {
                    Operator::Gt => a > b,
                    Operator::Gte => a >= b - EPSILON,
                    Operator::Lt => a < b,
                    _ => a <= b + EPSILON,
                },
                _ => false,
            }
        }
        (Operator::In, FilterValue::List(items)) => items.iter().any(|s| value.equals(s)),
        (Operator::NotIn, FilterValue::List(items)) => !items.iter().any(|s| value.equals(s)),
        (Operator::Contains, FilterValue::Scalar(Scalar::Text(needle))) => match &value {
            FieldValue::Text(haystack) => haystack
                .to_lowercase()
                .contains(&needle.trim().to_lowercase()),
            _ => false,
        },
        (Operator::Between, _) => match (value.number(), filter.bounds()) {
            (Some(v), Some((lo, hi))) => v >= lo - EPSILON && v <= hi + EPSILON,
            _ => false,
        },
        _ => false,
    }
}

/// True if every filter matches (filters are AND-combined).
#[must_use]
pub fn matches_all(filters: &[Filter], record: &GameRecord, side: Option<Side>) -> bool {
    filters.iter().all(|f| matches(f, record, side))
}

fn sample_record() -> GameRecord {
    let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap_or_default();
    let mut r = GameRecord::scheduled("sample", Sport::Nfl, 2023, date, "HOME", "AWAY");
    r.week = Some(18);
    r.home_score = Some(24);
    r.away_score = Some(17);
    r.spread = Some(-3.5);
    r.total = Some(44.5);
    r.home_moneyline = Some(-180);
    r.away_moneyline = Some(150);
    r.spread_result = Some(SpreadResult::Covered);
    r.total_result = Some(TotalResult::Under);
    r.home_rest_days = Some(7);
    r.away_rest_days = Some(6);
    r.home_rating = Some(5.5);
    r.away_rating = Some(1.0);
    r.home_rank = Some(4);
    r.away_rank = Some(12);
    r.home_streak = Some(3);
    r.away_streak = Some(-2);
    r.temperature = Some(28.0);
    r.wind_speed = Some(12.0);
    r.weather_condition = Some("Snow".to_string());
    r
}

/// Startup check that the whitelist and the resolution table agree: every
/// whitelisted field resolves on a fully populated record, from either
/// side, to a value of the field's declared kind.
///
/// # Errors
/// Returns `InvalidConfig` naming the first field that does not resolve.
pub fn verify_resolution_table() -> Result<(), ValidationError> {
    check_whitelist()?;
    let sample = sample_record();
    for side in [Side::Home, Side::Away] {
        for field in Field::ALL {
            match resolve(field, &sample, Some(side)) {
                Some(value) if value.kind() == field.kind() => {}
                Some(value) => {
                    return Err(ValidationError::InvalidConfig(format!(
                        "field '{field}' resolves to {:?}, declared {:?}",
                        value.kind(),
                        field.kind()
                    )))
                }
                None => {
                    return Err(ValidationError::InvalidConfig(format!(
                        "field '{field}' has no resolution rule"
                    )))
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_engine_core::Perspective;

    use crate::perspective::resolve_side;

    fn game() -> GameRecord {
        sample_record()
    }

    fn filter(json: &str) -> Filter {
        serde_json::from_str(json).unwrap()
    }

    // ============================================
    // Resolution
    // ============================================

    #[test]
    fn resolution_table_is_complete() {
        assert!(verify_resolution_table().is_ok());
    }

    #[test]
    fn spread_is_oriented_to_getting_points() {
        let g = game();
        let dog = resolve_side(&g, Perspective::Underdog, None);
        let fav = resolve_side(&g, Perspective::Favorite, None);
        assert_eq!(resolve(Field::Spread, &g, dog), Some(FieldValue::Number(3.5)));
        assert_eq!(resolve(Field::Spread, &g, fav), Some(FieldValue::Number(-3.5)));
    }

    #[test]
    fn side_relative_fields_swap() {
        let g = game();
        assert_eq!(resolve(Field::Margin, &g, Some(Side::Away)), Some(FieldValue::Number(-7.0)));
        assert_eq!(resolve(Field::RestAdvantage, &g, Some(Side::Home)), Some(FieldValue::Number(1.0)));
        assert_eq!(resolve(Field::RatingDiff, &g, Some(Side::Away)), Some(FieldValue::Number(-4.5)));
        assert_eq!(
            resolve(Field::Opponent, &g, Some(Side::Away)),
            Some(FieldValue::Text(Cow::Borrowed("HOME")))
        );
    }

    #[test]
    fn side_relative_without_side_is_absent() {
        let g = game();
        assert_eq!(resolve(Field::Spread, &g, None), None);
        assert_eq!(resolve(Field::Total, &g, None), Some(FieldValue::Number(44.5)));
    }

    // ============================================
    // Operators
    // ============================================

    #[test]
    fn between_is_inclusive() {
        let f = filter(r#"{"field":"spread","operator":"between","value":[-3,3]}"#);
        let mut g = GameRecord::scheduled(
            "x",
            Sport::Nfl,
            2023,
            NaiveDate::from_ymd_opt(2023, 9, 10).unwrap(),
            "A",
            "B",
        );
        for (spread, expected) in [(-3.0, true), (3.0, true), (3.5, false), (0.0, true)] {
            g.spread = Some(spread);
            assert_eq!(matches(&f, &g, Some(Side::Home)), expected, "spread {spread}");
        }
    }

    #[test]
    fn contains_is_case_insensitive() {
        let f = filter(r#"{"field":"weatherCondition","operator":"contains","value":"sNo"}"#);
        assert!(matches(&f, &game(), None));
    }

    #[test]
    fn in_and_not_in() {
        let f = filter(r#"{"field":"dayOfWeek","operator":"in","value":["Sunday","Monday"]}"#);
        assert!(matches(&f, &game(), None));
        let f = filter(r#"{"field":"week","operator":"notIn","value":[17,18]}"#);
        assert!(!matches(&f, &game(), None));
    }

    #[test]
    fn comparisons() {
        let g = game();
        let gt = filter(r#"{"field":"restDays","operator":"gt","value":6}"#);
        let lte = filter(r#"{"field":"restDays","operator":"lte","value":6}"#);
        assert!(matches(&gt, &g, Some(Side::Home)));
        assert!(!matches(&lte, &g, Some(Side::Home)));
        assert!(matches(&lte, &g, Some(Side::Away)));
    }

    #[test]
    fn absent_values_fail_comparisons() {
        let mut g = game();
        g.home_rating = None;
        let gt = filter(r#"{"field":"rating","operator":"gt","value":0}"#);
        let neq = filter(r#"{"field":"rating","operator":"neq","value":3}"#);
        assert!(!matches(&gt, &g, Some(Side::Home)));
        assert!(!matches(&neq, &g, Some(Side::Home)));
    }

    #[test]
    fn absent_value_matches_only_neq_null() {
        let mut g = game();
        g.home_rating = None;
        let eq_null = filter(r#"{"field":"rating","operator":"eq","value":null}"#);
        let neq_null = filter(r#"{"field":"rating","operator":"neq","value":null}"#);
        assert!(matches(&neq_null, &g, Some(Side::Home)));
        assert!(!matches(&eq_null, &g, Some(Side::Home)));
        // away rating is present
        assert!(matches(&neq_null, &g, Some(Side::Away)));
        assert!(!matches(&eq_null, &g, Some(Side::Away)));
    }

    #[test]
    fn boolean_and_text_equality() {
        let g = game();
        let home = filter(r#"{"field":"isHome","operator":"eq","value":true}"#);
        let team = filter(r#"{"field":"team","operator":"eq","value":"home"}"#);
        assert!(matches(&home, &g, Some(Side::Home)));
        assert!(!matches(&home, &g, Some(Side::Away)));
        assert!(matches(&team, &g, Some(Side::Home)));
    }

    #[test]
    fn favorite_flags_absent_without_line() {
        let mut g = game();
        g.spread = None;
        let fav = filter(r#"{"field":"isFavorite","operator":"eq","value":false}"#);
        assert!(!matches(&fav, &g, Some(Side::Home)));
    }

    #[test]
    fn filters_are_and_combined() {
        let g = game();
        let filters = vec![
            filter(r#"{"field":"isHome","operator":"eq","value":true}"#),
            filter(r#"{"field":"temperature","operator":"lt","value":20}"#),
        ];
        assert!(!matches_all(&filters, &g, Some(Side::Home)));
        assert!(matches_all(&filters[..1], &g, Some(Side::Home)));
        assert!(matches_all(&[], &g, None));
    }
}
