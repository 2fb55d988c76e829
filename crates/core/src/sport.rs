//! Per-sport parameters consumed by schedule enrichment and the angle
//! library. Sports differ only in these values; the algorithms are shared.

use serde::{Deserialize, Serialize};

use crate::record::Sport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportConfig {
    pub sport: Sport,
    /// Rest days at or above which a team is treated as coming off a bye.
    /// `None` for sports without byes.
    pub bye_rest_days: Option<u32>,
    /// Rest days at or below which a team is on short rest.
    pub short_rest_days: u32,
    /// Gaps longer than this are season breaks, not rest.
    pub max_rest_days: u32,
    /// Spread magnitude at or above which a favorite is a big favorite.
    pub big_favorite_spread: f64,
    /// Total at or above which a game is a high total.
    pub high_total: f64,
    /// Most common final margins.
    pub key_numbers: Vec<f64>,
    /// Weather affects play.
    pub outdoor: bool,
    /// Poll rankings are meaningful.
    pub uses_rankings: bool,
    /// Standard two-team teaser points, if teasers are offered.
    pub teaser_points: Option<f64>,
    pub cold_temperature: f64,
    pub high_wind: f64,
    /// Win or loss streak length treated as notable.
    pub streak_length: i32,
}

impl SportConfig {
    #[must_use]
    pub fn for_sport(sport: Sport) -> Self {
        let base = Self {
            sport,
            bye_rest_days: None,
            short_rest_days: 1,
            max_rest_days: 30,
            big_favorite_spread: 7.0,
            high_total: 47.0,
            key_numbers: Vec::new(),
            outdoor: false,
            uses_rankings: false,
            teaser_points: None,
            cold_temperature: 32.0,
            high_wind: 15.0,
            streak_length: 3,
        };

        match sport {
            Sport::Nfl => Self {
                bye_rest_days: Some(13),
                short_rest_days: 5,
                key_numbers: vec![3.0, 7.0],
                outdoor: true,
                teaser_points: Some(6.0),
                ..base
            },
            Sport::Ncaaf => Self {
                bye_rest_days: Some(13),
                short_rest_days: 5,
                big_favorite_spread: 14.0,
                high_total: 60.0,
                key_numbers: vec![3.0, 7.0],
                outdoor: true,
                uses_rankings: true,
                teaser_points: Some(6.0),
                ..base
            },
            Sport::Nba => Self {
                big_favorite_spread: 10.0,
                high_total: 230.0,
                teaser_points: Some(4.0),
                streak_length: 4,
                ..base
            },
            Sport::Ncaab => Self {
                big_favorite_spread: 12.0,
                high_total: 150.0,
                uses_rankings: true,
                teaser_points: Some(4.0),
                streak_length: 4,
                ..base
            },
            Sport::Mlb => Self {
                max_rest_days: 10,
                big_favorite_spread: 1.5,
                high_total: 9.5,
                outdoor: true,
                streak_length: 4,
                ..base
            },
            Sport::Nhl => Self {
                big_favorite_spread: 1.5,
                high_total: 6.5,
                streak_length: 4,
                ..base
            },
        }
    }

    #[must_use]
    pub fn has_byes(&self) -> bool {
        self.bye_rest_days.is_some()
    }
}
