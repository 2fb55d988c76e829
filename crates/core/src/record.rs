//! Game records: the immutable facts every trend is computed from.
//!
//! Lines and settlements are stored from the home team's point of view:
//! a negative `spread` means the home team is favored, and `spread_result`
//! describes whether the home team covered.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported leagues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    /// National Football League
    Nfl,
    /// National Basketball Association
    Nba,
    /// Major League Baseball
    Mlb,
    /// National Hockey League
    Nhl,
    /// College football
    Ncaaf,
    /// College basketball
    Ncaab,
}

impl Sport {
    /// All supported sports.
    pub const ALL: [Sport; 6] = [
        Sport::Nfl,
        Sport::Nba,
        Sport::Mlb,
        Sport::Nhl,
        Sport::Ncaaf,
        Sport::Ncaab,
    ];

    /// Upper-case league code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Nfl => "NFL",
            Self::Nba => "NBA",
            Self::Mlb => "MLB",
            Self::Nhl => "NHL",
            Self::Ncaaf => "NCAAF",
            Self::Ncaab => "NCAAB",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sport| sport.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sport '{s}'"))
    }
}

/// Home team's result against the spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadResult {
    /// Home team covered.
    Covered,
    /// Home team failed to cover.
    Lost,
    /// Landed exactly on the number.
    Push,
}

impl SpreadResult {
    /// Re-orients a home-perspective result to the away side.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Covered => Self::Lost,
            Self::Lost => Self::Covered,
            Self::Push => Self::Push,
        }
    }
}

impl FromStr for SpreadResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COVERED" => Ok(Self::Covered),
            "LOST" => Ok(Self::Lost),
            "PUSH" => Ok(Self::Push),
            other => Err(format!("unknown spread result '{other}'")),
        }
    }
}

/// Combined score against the posted total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TotalResult {
    /// Combined score exceeded the total.
    Over,
    /// Combined score fell short of the total.
    Under,
    /// Landed exactly on the number.
    Push,
}

impl FromStr for TotalResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OVER" => Ok(Self::Over),
            "UNDER" => Ok(Self::Under),
            "PUSH" => Ok(Self::Push),
            other => Err(format!("unknown total result '{other}'")),
        }
    }
}

/// One side of a contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Home team
    Home,
    /// Away team
    Away,
}

impl Side {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

/// One played or scheduled contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Stable game identifier.
    pub id: String,
    pub sport: Sport,
    pub season: i32,
    #[serde(default)]
    pub week: Option<u32>,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    /// Final home score, absent until played.
    #[serde(default)]
    pub home_score: Option<u32>,
    /// Final away score, absent until played.
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Closing spread from the home side (negative = home favored).
    #[serde(default)]
    pub spread: Option<f64>,
    /// Closing total.
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub home_moneyline: Option<i32>,
    #[serde(default)]
    pub away_moneyline: Option<i32>,
    /// Home team's result against the spread.
    #[serde(default)]
    pub spread_result: Option<SpreadResult>,
    #[serde(default)]
    pub total_result: Option<TotalResult>,
    #[serde(default)]
    pub is_conference_game: bool,
    #[serde(default)]
    pub is_division_game: bool,
    #[serde(default)]
    pub is_playoff: bool,
    #[serde(default)]
    pub is_neutral_site: bool,
    #[serde(default)]
    pub is_primetime: bool,
    #[serde(default)]
    pub is_dome: bool,
    #[serde(default)]
    pub home_rest_days: Option<u32>,
    #[serde(default)]
    pub away_rest_days: Option<u32>,
    /// Efficiency rating merged from an external provider.
    #[serde(default)]
    pub home_rating: Option<f64>,
    #[serde(default)]
    pub away_rating: Option<f64>,
    /// Poll ranking, absent when unranked.
    #[serde(default)]
    pub home_rank: Option<u32>,
    #[serde(default)]
    pub away_rank: Option<u32>,
    /// Streak entering the game (positive = wins, negative = losses).
    #[serde(default)]
    pub home_streak: Option<i32>,
    #[serde(default)]
    pub away_streak: Option<i32>,
    /// Kickoff temperature in Fahrenheit.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Wind speed in mph.
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub weather_condition: Option<String>,
}

impl GameRecord {
    /// Creates a scheduled game with no lines, scores or attributes.
    #[must_use]
    pub fn scheduled(
        id: impl Into<String>,
        sport: Sport,
        season: i32,
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sport,
            season,
            week: None,
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score: None,
            away_score: None,
            spread: None,
            total: None,
            home_moneyline: None,
            away_moneyline: None,
            spread_result: None,
            total_result: None,
            is_conference_game: false,
            is_division_game: false,
            is_playoff: false,
            is_neutral_site: false,
            is_primetime: false,
            is_dome: false,
            home_rest_days: None,
            away_rest_days: None,
            home_rating: None,
            away_rating: None,
            home_rank: None,
            away_rank: None,
            home_streak: None,
            away_streak: None,
            temperature: None,
            wind_speed: None,
            weather_condition: None,
        }
    }

    /// Returns true once both final scores are known.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Team name for a side.
    #[must_use]
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Which side a team played on, matched case-insensitively.
    #[must_use]
    pub fn side_of(&self, team: &str) -> Option<Side> {
        let team = team.trim();
        if self.home_team.eq_ignore_ascii_case(team) {
            Some(Side::Home)
        } else if self.away_team.eq_ignore_ascii_case(team) {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Side favored by the spread, `None` for a pick'em or missing line.
    #[must_use]
    pub fn favorite(&self) -> Option<Side> {
        match self.spread {
            Some(s) if s < 0.0 => Some(Side::Home),
            Some(s) if s > 0.0 => Some(Side::Away),
            _ => None,
        }
    }

    /// Spread from a side's point of view (positive = getting points).
    #[must_use]
    pub fn spread_for(&self, side: Side) -> Option<f64> {
        self.spread.map(|s| match side {
            Side::Home => s,
            Side::Away => -s,
        })
    }

    /// Final score for a side.
    #[must_use]
    pub fn score(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    /// Final margin from a side's point of view.
    #[must_use]
    pub fn margin_for(&self, side: Side) -> Option<i64> {
        let ours = i64::from(self.score(side)?);
        let theirs = i64::from(self.score(side.opposite())?);
        Some(ours - theirs)
    }

    /// Combined final score.
    #[must_use]
    pub fn total_points(&self) -> Option<u32> {
        Some(self.home_score? + self.away_score?)
    }

    /// Straight-up winner, `None` for a tie or unplayed game.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        match self.margin_for(Side::Home)? {
            m if m > 0 => Some(Side::Home),
            m if m < 0 => Some(Side::Away),
            _ => None,
        }
    }

    #[must_use]
    pub fn moneyline(&self, side: Side) -> Option<i32> {
        match side {
            Side::Home => self.home_moneyline,
            Side::Away => self.away_moneyline,
        }
    }

    #[must_use]
    pub fn rest_days(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_rest_days,
            Side::Away => self.away_rest_days,
        }
    }

    #[must_use]
    pub fn rating(&self, side: Side) -> Option<f64> {
        match side {
            Side::Home => self.home_rating,
            Side::Away => self.away_rating,
        }
    }

    #[must_use]
    pub fn rank(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_rank,
            Side::Away => self.away_rank,
        }
    }

    #[must_use]
    pub fn streak(&self, side: Side) -> Option<i32> {
        match side {
            Side::Home => self.home_streak,
            Side::Away => self.away_streak,
        }
    }

    /// Spread settlement from a side's point of view.
    #[must_use]
    pub fn spread_result_for(&self, side: Side) -> Option<SpreadResult> {
        self.spread_result.map(|r| match side {
            Side::Home => r,
            Side::Away => r.flipped(),
        })
    }

    /// Day of the week as a full English name.
    #[must_use]
    pub fn day_of_week(&self) -> &'static str {
        match self.date.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// Calendar month, 1-12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}
