//! The closed whitelist of queryable fields.
//!
//! Every filter names one of these fields. The evaluator resolves each
//! variant through an exhaustive match, so adding a field here without a
//! resolution rule fails to compile.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Version of the queryable field list.
pub const WHITELIST_VERSION: &str = "2024.2";

/// Value type of a field, used to validate operators and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Boolean,
    Text,
}

/// A queryable field.
///
/// Side-relative fields (`spread`, `points`, `restDays`, ...) are resolved
/// from the query's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Field {
    Season,
    Week,
    Month,
    DayOfWeek,
    Team,
    Opponent,
    HomeTeam,
    AwayTeam,
    IsHome,
    IsFavorite,
    IsUnderdog,
    Spread,
    Total,
    Moneyline,
    Points,
    OpponentPoints,
    Margin,
    TotalPoints,
    RestDays,
    OpponentRestDays,
    RestAdvantage,
    Rating,
    OpponentRating,
    RatingDiff,
    Rank,
    OpponentRank,
    IsRanked,
    OpponentIsRanked,
    Streak,
    OpponentStreak,
    IsConferenceGame,
    IsDivisionGame,
    IsPlayoff,
    IsNeutralSite,
    IsPrimetime,
    IsDome,
    Temperature,
    WindSpeed,
    WeatherCondition,
}

impl Field {
    /// Every whitelisted field.
    pub const ALL: [Field; 39] = [
        Field::Season,
        Field::Week,
        Field::Month,
        Field::DayOfWeek,
        Field::Team,
        Field::Opponent,
        Field::HomeTeam,
        Field::AwayTeam,
        Field::IsHome,
        Field::IsFavorite,
        Field::IsUnderdog,
        Field::Spread,
        Field::Total,
        Field::Moneyline,
        Field::Points,
        Field::OpponentPoints,
        Field::Margin,
        Field::TotalPoints,
        Field::RestDays,
        Field::OpponentRestDays,
        Field::RestAdvantage,
        Field::Rating,
        Field::OpponentRating,
        Field::RatingDiff,
        Field::Rank,
        Field::OpponentRank,
        Field::IsRanked,
        Field::OpponentIsRanked,
        Field::Streak,
        Field::OpponentStreak,
        Field::IsConferenceGame,
        Field::IsDivisionGame,
        Field::IsPlayoff,
        Field::IsNeutralSite,
        Field::IsPrimetime,
        Field::IsDome,
        Field::Temperature,
        Field::WindSpeed,
        Field::WeatherCondition,
    ];

    /// Wire name used in queries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Season => "season",
            Self::Week => "week",
            Self::Month => "month",
            Self::DayOfWeek => "dayOfWeek",
            Self::Team => "team",
            Self::Opponent => "opponent",
            Self::HomeTeam => "homeTeam",
            Self::AwayTeam => "awayTeam",
            Self::IsHome => "isHome",
            Self::IsFavorite => "isFavorite",
            Self::IsUnderdog => "isUnderdog",
            Self::Spread => "spread",
            Self::Total => "total",
            Self::Moneyline => "moneyline",
            Self::Points => "points",
            Self::OpponentPoints => "opponentPoints",
            Self::Margin => "margin",
            Self::TotalPoints => "totalPoints",
            Self::RestDays => "restDays",
            Self::OpponentRestDays => "opponentRestDays",
            Self::RestAdvantage => "restAdvantage",
            Self::Rating => "rating",
            Self::OpponentRating => "opponentRating",
            Self::RatingDiff => "ratingDiff",
            Self::Rank => "rank",
            Self::OpponentRank => "opponentRank",
            Self::IsRanked => "isRanked",
            Self::OpponentIsRanked => "opponentIsRanked",
            Self::Streak => "streak",
            Self::OpponentStreak => "opponentStreak",
            Self::IsConferenceGame => "isConferenceGame",
            Self::IsDivisionGame => "isDivisionGame",
            Self::IsPlayoff => "isPlayoff",
            Self::IsNeutralSite => "isNeutralSite",
            Self::IsPrimetime => "isPrimetime",
            Self::IsDome => "isDome",
            Self::Temperature => "temperature",
            Self::WindSpeed => "windSpeed",
            Self::WeatherCondition => "weatherCondition",
        }
    }

    /// Value type of the field.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::DayOfWeek
            | Self::Team
            | Self::Opponent
            | Self::HomeTeam
            | Self::AwayTeam
            | Self::WeatherCondition => FieldKind::Text,
            Self::IsHome
            | Self::IsFavorite
            | Self::IsUnderdog
            | Self::IsRanked
            | Self::OpponentIsRanked
            | Self::IsConferenceGame
            | Self::IsDivisionGame
            | Self::IsPlayoff
            | Self::IsNeutralSite
            | Self::IsPrimetime
            | Self::IsDome => FieldKind::Boolean,
            Self::Season
            | Self::Week
            | Self::Month
            | Self::Spread
            | Self::Total
            | Self::Moneyline
            | Self::Points
            | Self::OpponentPoints
            | Self::Margin
            | Self::TotalPoints
            | Self::RestDays
            | Self::OpponentRestDays
            | Self::RestAdvantage
            | Self::Rating
            | Self::OpponentRating
            | Self::RatingDiff
            | Self::Rank
            | Self::OpponentRank
            | Self::Streak
            | Self::OpponentStreak
            | Self::Temperature
            | Self::WindSpeed => FieldKind::Numeric,
        }
    }

    /// True if the value depends on which side the query looks from.
    #[must_use]
    pub const fn is_side_relative(self) -> bool {
        matches!(
            self,
            Self::Team
                | Self::Opponent
                | Self::IsHome
                | Self::IsFavorite
                | Self::IsUnderdog
                | Self::Spread
                | Self::Moneyline
                | Self::Points
                | Self::OpponentPoints
                | Self::Margin
                | Self::RestDays
                | Self::OpponentRestDays
                | Self::RestAdvantage
                | Self::Rating
                | Self::OpponentRating
                | Self::RatingDiff
                | Self::Rank
                | Self::OpponentRank
                | Self::IsRanked
                | Self::OpponentIsRanked
                | Self::Streak
                | Self::OpponentStreak
        )
    }

    /// True if the field is only known after the game is played.
    #[must_use]
    pub const fn is_outcome(self) -> bool {
        matches!(
            self,
            Self::Points | Self::OpponentPoints | Self::Margin | Self::TotalPoints
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

impl TryFrom<String> for Field {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Field> for &'static str {
    fn from(field: Field) -> Self {
        field.name()
    }
}

/// Checks that the whitelist is internally consistent: names are unique and
/// every name parses back to its own variant.
///
/// # Errors
/// Returns `InvalidConfig` naming the first inconsistent field.
pub fn check_whitelist() -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        if !seen.insert(field.name()) {
            return Err(ValidationError::InvalidConfig(format!(
                "duplicate whitelist name '{}'",
                field.name()
            )));
        }
        if field.name().parse::<Field>()? != field {
            return Err(ValidationError::InvalidConfig(format!(
                "whitelist name '{}' does not round-trip",
                field.name()
            )));
        }
    }
    Ok(())
}
