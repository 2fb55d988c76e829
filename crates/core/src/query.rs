//! Trend queries and their filters.
//!
//! Both types validate on construction, including when deserialized, so an
//! evaluator never sees an unknown field, a malformed `between` pair or an
//! oversized `in` list.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::field::{Field, FieldKind};
use crate::record::Sport;

/// Maximum number of elements in an `in`/`notIn` list.
pub const MAX_LIST_LEN: usize = 50;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    Between,
}

impl Operator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
            Self::Between => "between",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single comparable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    const fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Boolean,
            Self::Number(_) => FieldKind::Numeric,
            Self::Text(_) => FieldKind::Text,
        }
    }

    /// Numeric value, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null comparison, only valid with `eq`/`neq`.
    Null,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Wire form of a filter, validated into [`Filter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFilter {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

/// A validated `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub struct Filter {
    field: Field,
    operator: Operator,
    value: FilterValue,
}

impl Filter {
    /// Creates a filter, validating the operator and value against the field type.
    ///
    /// # Errors
    /// Returns a `ValidationError` describing the first problem found.
    pub fn new(field: Field, operator: Operator, value: FilterValue) -> Result<Self, ValidationError> {
        validate(field, operator, &value)?;
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Creates a filter from a field name, rejecting names off the whitelist.
    ///
    /// # Errors
    /// Returns `UnknownField` or any validation error from [`Filter::new`].
    pub fn parse(field: &str, operator: Operator, value: FilterValue) -> Result<Self, ValidationError> {
        Self::new(field.parse()?, operator, value)
    }

    /// `field == value`.
    ///
    /// # Errors
    /// Returns an error if the value type does not match the field.
    pub fn equals(field: Field, value: impl Into<Scalar>) -> Result<Self, ValidationError> {
        Self::new(field, Operator::Eq, FilterValue::Scalar(value.into()))
    }

    /// Single-bound numeric comparison (`gt`, `gte`, `lt`, `lte`).
    ///
    /// # Errors
    /// Returns an error if the field is not numeric.
    pub fn compare(field: Field, operator: Operator, value: f64) -> Result<Self, ValidationError> {
        Self::new(field, operator, FilterValue::Scalar(Scalar::Number(value)))
    }

    /// Inclusive `lo <= field <= hi`.
    ///
    /// # Errors
    /// Returns `InvalidBetween` if `lo > hi` or the field is not numeric.
    pub fn between(field: Field, lo: f64, hi: f64) -> Result<Self, ValidationError> {
        Self::new(
            field,
            Operator::Between,
            FilterValue::List(vec![Scalar::Number(lo), Scalar::Number(hi)]),
        )
    }

    #[must_use]
    pub const fn field(&self) -> Field {
        self.field
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub const fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Bounds of a `between` filter.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (&self.operator, &self.value) {
            (Operator::Between, FilterValue::List(items)) => {
                Some((items.first()?.as_number()?, items.get(1)?.as_number()?))
            }
            _ => None,
        }
    }
}

impl TryFrom<RawFilter> for Filter {
    type Error = ValidationError;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        Self::parse(&raw.field, raw.operator, raw.value)
    }
}

impl From<Filter> for RawFilter {
    fn from(filter: Filter) -> Self {
        Self {
            field: filter.field.name().to_string(),
            operator: filter.operator,
            value: filter.value,
        }
    }
}

fn validate(field: Field, operator: Operator, value: &FilterValue) -> Result<(), ValidationError> {
    let kind = field.kind();
    let mismatch = |expected: &str| ValidationError::ValueTypeMismatch {
        field: field.name().to_string(),
        expected: expected.to_string(),
    };
    let unsupported = || ValidationError::OperatorNotSupported {
        field: field.name().to_string(),
        operator: operator.name().to_string(),
    };

    match operator {
        Operator::Eq | Operator::Neq => match value {
            FilterValue::Null => Ok(()),
            FilterValue::Scalar(s) => check_scalar(field, s),
            FilterValue::List(_) => Err(mismatch("a single value or null")),
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            if kind != FieldKind::Numeric {
                return Err(unsupported());
            }
            match value {
                FilterValue::Scalar(s @ Scalar::Number(_)) => check_scalar(field, s),
                _ => Err(mismatch("a number")),
            }
        }
        Operator::Contains => {
            if kind != FieldKind::Text {
                return Err(unsupported());
            }
            match value {
                FilterValue::Scalar(Scalar::Text(_)) => Ok(()),
                _ => Err(mismatch("a string")),
            }
        }
        Operator::In | Operator::NotIn => match value {
            FilterValue::List(items) => {
                if items.is_empty() {
                    return Err(ValidationError::EmptyList(field.name().to_string()));
                }
                if items.len() > MAX_LIST_LEN {
                    return Err(ValidationError::ListTooLarge {
                        field: field.name().to_string(),
                        len: items.len(),
                        max: MAX_LIST_LEN,
                    });
                }
                items.iter().try_for_each(|s| check_scalar(field, s))
            }
            _ => Err(mismatch("an array")),
        },
        Operator::Between => {
            if kind != FieldKind::Numeric {
                return Err(unsupported());
            }
            let invalid = |reason: &str| ValidationError::InvalidBetween {
                field: field.name().to_string(),
                reason: reason.to_string(),
            };
            let FilterValue::List(items) = value else {
                return Err(invalid("expected a two-element array"));
            };
            let [lo, hi] = items.as_slice() else {
                return Err(invalid("expected exactly two elements"));
            };
            let (Some(lo), Some(hi)) = (lo.as_number(), hi.as_number()) else {
                return Err(invalid("both bounds must be numbers"));
            };
            if !lo.is_finite() || !hi.is_finite() {
                return Err(invalid("bounds must be finite"));
            }
            if lo > hi {
                return Err(invalid("lower bound exceeds upper bound"));
            }
            Ok(())
        }
    }
}

fn check_scalar(field: Field, scalar: &Scalar) -> Result<(), ValidationError> {
    let kind = field.kind();
    if scalar.kind() != kind {
        let expected = match kind {
            FieldKind::Numeric => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Text => "a string",
        };
        return Err(ValidationError::ValueTypeMismatch {
            field: field.name().to_string(),
            expected: expected.to_string(),
        });
    }
    if let Scalar::Number(n) = scalar {
        if !n.is_finite() {
            return Err(ValidationError::ValueTypeMismatch {
                field: field.name().to_string(),
                expected: "a finite number".to_string(),
            });
        }
    }
    Ok(())
}

/// Viewpoint used to orient side-relative fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Home,
    Away,
    Favorite,
    Underdog,
    /// The query's named team.
    Team,
    /// Whoever the query's named team played.
    Opponent,
}

/// Inclusive range of seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl SeasonRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    /// Returns `InvalidSeasonRange`.
    pub fn new(start: i32, end: i32) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidSeasonRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn contains(&self, season: i32) -> bool {
        season >= self.start && season <= self.end
    }
}

/// Result ordering by game date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOrder {
    /// Most recent games first.
    Newest,
    /// Oldest games first.
    Oldest,
}

/// Wire form of a query, validated into [`TrendQuery`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrendQuery {
    pub sport: Sport,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub perspective: Option<Perspective>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub seasons: Option<SeasonRange>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: Option<QueryOrder>,
}

/// A validated trend query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrendQuery", into = "RawTrendQuery")]
pub struct TrendQuery {
    sport: Sport,
    team: Option<String>,
    perspective: Option<Perspective>,
    filters: Vec<Filter>,
    seasons: Option<SeasonRange>,
    limit: Option<usize>,
    order: Option<QueryOrder>,
}

impl TrendQuery {
    /// Starts building a query for a sport.
    #[must_use]
    pub fn builder(sport: Sport) -> TrendQueryBuilder {
        TrendQueryBuilder {
            raw: RawTrendQuery {
                sport,
                team: None,
                perspective: None,
                filters: Vec::new(),
                seasons: None,
                limit: None,
                order: None,
            },
        }
    }

    #[must_use]
    pub const fn sport(&self) -> Sport {
        self.sport
    }

    #[must_use]
    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub const fn seasons(&self) -> Option<SeasonRange> {
        self.seasons
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub const fn order(&self) -> Option<QueryOrder> {
        self.order
    }

    /// Perspective used for evaluation: the explicit one, else the named
    /// team, else home.
    #[must_use]
    pub fn perspective(&self) -> Perspective {
        match (self.perspective, &self.team) {
            (Some(p), _) => p,
            (None, Some(_)) => Perspective::Team,
            (None, None) => Perspective::Home,
        }
    }
}

impl TryFrom<RawTrendQuery> for TrendQuery {
    type Error = ValidationError;

    fn try_from(raw: RawTrendQuery) -> Result<Self, Self::Error> {
        let team = raw
            .team
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if matches!(raw.perspective, Some(Perspective::Team | Perspective::Opponent))
            && team.is_none()
        {
            return Err(ValidationError::InvalidQuery(
                "team and opponent perspectives require a team".to_string(),
            ));
        }
        if let Some(range) = raw.seasons {
            SeasonRange::new(range.start, range.end)?;
        }
        if raw.limit == Some(0) {
            return Err(ValidationError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sport: raw.sport,
            team,
            perspective: raw.perspective,
            filters: raw.filters,
            seasons: raw.seasons,
            limit: raw.limit,
            order: raw.order,
        })
    }
}

impl From<TrendQuery> for RawTrendQuery {
    fn from(q: TrendQuery) -> Self {
        Self {
            sport: q.sport,
            team: q.team,
            perspective: q.perspective,
            filters: q.filters,
            seasons: q.seasons,
            limit: q.limit,
            order: q.order,
        }
    }
}

/// Builder for [`TrendQuery`].
#[derive(Debug, Clone)]
pub struct TrendQueryBuilder {
    raw: RawTrendQuery,
}

impl TrendQueryBuilder {
    #[must_use]
    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.raw.team = Some(team.into());
        self
    }

    #[must_use]
    pub fn perspective(mut self, perspective: Perspective) -> Self {
        self.raw.perspective = Some(perspective);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.raw.filters.push(filter);
        self
    }

    #[must_use]
    pub fn seasons(mut self, range: SeasonRange) -> Self {
        self.raw.seasons = Some(range);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.raw.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn order(mut self, order: QueryOrder) -> Self {
        self.raw.order = Some(order);
        self
    }

    /// Validates and returns the query.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the query is structurally invalid.
    pub fn build(self) -> Result<TrendQuery, ValidationError> {
        TrendQuery::try_from(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================
    // Filter validation
    // ============================================

    #[test]
    fn between_requires_ordered_pair() {
        assert!(Filter::between(Field::Spread, -3.0, 3.0).is_ok());
        let err = Filter::between(Field::Spread, 3.0, -3.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBetween { .. }));
    }

    #[test]
    fn between_rejects_wrong_arity() {
        let value = FilterValue::List(vec![Scalar::Number(1.0)]);
        let err = Filter::new(Field::Total, Operator::Between, value).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBetween { .. }));

        let value = FilterValue::List(vec![1.0.into(), 2.0.into(), 3.0.into()]);
        assert!(Filter::new(Field::Total, Operator::Between, value).is_err());
    }

    #[test]
    fn between_on_text_field_is_rejected() {
        let value = FilterValue::List(vec![1.0.into(), 2.0.into()]);
        let err = Filter::new(Field::Team, Operator::Between, value).unwrap_err();
        assert!(matches!(err, ValidationError::OperatorNotSupported { .. }));
    }

    #[test]
    fn in_list_of_fifty_is_accepted() {
        let items: Vec<Scalar> = (0..50).map(|i| Scalar::Number(f64::from(i))).collect();
        assert!(Filter::new(Field::Week, Operator::In, FilterValue::List(items)).is_ok());
    }

    #[test]
    fn in_list_over_fifty_is_rejected_not_truncated() {
        let items: Vec<Scalar> = (0..51).map(|i| Scalar::Number(f64::from(i))).collect();
        let err = Filter::new(Field::Week, Operator::NotIn, FilterValue::List(items)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ListTooLarge {
                field: "week".to_string(),
                len: 51,
                max: 50
            }
        );
    }

    #[test]
    fn in_list_element_types_must_match() {
        let items = vec![Scalar::Text("Chiefs".into()), Scalar::Number(3.0)];
        let err = Filter::new(Field::Team, Operator::In, FilterValue::List(items)).unwrap_err();
        assert!(matches!(err, ValidationError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn contains_on_numeric_field_is_an_error() {
        let err = Filter::new(
            Field::Spread,
            Operator::Contains,
            FilterValue::Scalar("3".into()),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OperatorNotSupported { .. }));
    }

    #[test]
    fn ordering_operators_require_numeric_field() {
        assert!(Filter::compare(Field::RestDays, Operator::Gte, 7.0).is_ok());
        let err = Filter::new(
            Field::IsPlayoff,
            Operator::Gt,
            FilterValue::Scalar(Scalar::Bool(true)),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OperatorNotSupported { .. }));
    }

    #[test]
    fn null_only_with_equality() {
        assert!(Filter::new(Field::Rating, Operator::Neq, FilterValue::Null).is_ok());
        assert!(Filter::new(Field::Rating, Operator::Gt, FilterValue::Null).is_err());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        assert!(Filter::compare(Field::Total, Operator::Gt, f64::NAN).is_err());
        assert!(Filter::between(Field::Total, f64::NEG_INFINITY, 40.0).is_err());
    }

    #[test]
    fn eq_value_type_must_match() {
        assert!(Filter::equals(Field::IsPrimetime, true).is_ok());
        assert!(Filter::equals(Field::IsPrimetime, 1.0).is_err());
    }

    // ============================================
    // Deserialization enforces the whitelist
    // ============================================

    #[test]
    fn filter_deserializes_and_validates() {
        let f: Filter =
            serde_json::from_str(r#"{"field":"spread","operator":"between","value":[-3,3]}"#)
                .unwrap();
        assert_eq!(f.field(), Field::Spread);
        assert_eq!(f.bounds(), Some((-3.0, 3.0)));
    }

    #[test]
    fn unknown_field_fails_at_deserialization() {
        let result: Result<Filter, _> =
            serde_json::from_str(r#"{"field":"luckFactor","operator":"eq","value":1}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("luckFactor"), "{err}");
    }

    #[test]
    fn not_in_operator_uses_camel_case() {
        let f: Filter =
            serde_json::from_str(r#"{"field":"team","operator":"notIn","value":["Jets"]}"#)
                .unwrap();
        assert_eq!(f.operator(), Operator::NotIn);
    }

    // ============================================
    // TrendQuery
    // ============================================

    #[test]
    fn query_defaults_to_home_perspective() {
        let q = TrendQuery::builder(Sport::Nfl).build().unwrap();
        assert_eq!(q.perspective(), Perspective::Home);
    }

    #[test]
    fn query_with_team_defaults_to_team_perspective() {
        let q = TrendQuery::builder(Sport::Nfl).team("Packers").build().unwrap();
        assert_eq!(q.perspective(), Perspective::Team);
        assert_eq!(q.team(), Some("Packers"));
    }

    #[test]
    fn opponent_perspective_requires_team() {
        let err = TrendQuery::builder(Sport::Nba)
            .perspective(Perspective::Opponent)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuery(_)));
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(TrendQuery::builder(Sport::Nba).limit(0).build().is_err());
    }

    #[test]
    fn inverted_season_range_is_rejected() {
        assert!(SeasonRange::new(2024, 2020).is_err());
        let json = r#"{"sport":"NFL","seasons":{"start":2024,"end":2020}}"#;
        assert!(serde_json::from_str::<TrendQuery>(json).is_err());
    }

    #[test]
    fn query_deserializes_from_wire_form() {
        let json = r#"{
            "sport": "NFL",
            "perspective": "home",
            "filters": [{"field": "isPrimetime", "operator": "eq", "value": true}],
            "limit": 100,
            "order": "newest"
        }"#;
        let q: TrendQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.sport(), Sport::Nfl);
        assert_eq!(q.filters().len(), 1);
        assert_eq!(q.limit(), Some(100));
        assert_eq!(q.order(), Some(QueryOrder::Newest));
    }
}
