//! Merging externally sourced attributes onto game records.
//!
//! Records are never mutated in place; each function returns new records.

use chrono::NaiveDate;
use std::collections::HashMap;
use trend_engine_core::{GameRecord, Side, SportConfig};

use crate::ratings::RatingTable;

/// Copies ratings from `table` onto records of the table's season.
///
/// Ratings already on a record are replaced when the table has the team;
/// teams the table does not know keep whatever they had.
#[must_use]
pub fn enrich_records(records: &[GameRecord], table: &RatingTable) -> Vec<GameRecord> {
    let mut missing = 0_usize;
    let enriched = records
        .iter()
        .map(|record| {
            let mut out = record.clone();
            if record.season != table.season {
                return out;
            }
            match table.get(&record.home_team) {
                Some(r) => out.home_rating = Some(r),
                None => missing += 1,
            }
            match table.get(&record.away_team) {
                Some(r) => out.away_rating = Some(r),
                None => missing += 1,
            }
            out
        })
        .collect();

    if missing > 0 {
        tracing::debug!(source = %table.source, season = table.season, missing, "teams without ratings");
    }
    enriched
}

#[derive(Debug, Default)]
struct TeamState {
    last_played: Option<(i32, NaiveDate)>,
    streak: i32,
    streak_season: i32,
}

/// Fills missing rest days and streaks from the schedule itself.
///
/// Rest days are calendar days since the team's previous game in the same
/// season; gaps above `config.max_rest_days` are treated as unknown. The
/// streak is the signed run of straight-up results before the game
/// (positive for wins), reset by ties and at season boundaries. Values
/// already present are kept. Output preserves input order.
#[must_use]
pub fn derive_schedule_attributes(records: &[GameRecord], config: &SportConfig) -> Vec<GameRecord> {
    let mut order: Vec<usize> = (0..records.len())
        .filter(|&i| records[i].sport == config.sport)
        .collect();
    order.sort_by(|&a, &b| {
        records[a]
            .date
            .cmp(&records[b].date)
            .then_with(|| records[a].id.cmp(&records[b].id))
    });

    let mut out = records.to_vec();
    let mut teams: HashMap<String, TeamState> = HashMap::new();

    for i in order {
        let record = &records[i];
        for side in [Side::Home, Side::Away] {
            let key = record.team(side).to_lowercase();
            let state = teams.entry(key).or_default();

            let rest = state.last_played.and_then(|(season, last)| {
                let days = (record.date - last).num_days();
                (season == record.season && days >= 0)
                    .then(|| u32::try_from(days).ok())
                    .flatten()
                    .filter(|d| *d <= config.max_rest_days)
            });
            let streak = if state.streak_season == record.season {
                state.streak
            } else {
                0
            };

            let target = &mut out[i];
            match side {
                Side::Home => {
                    target.home_rest_days = target.home_rest_days.or(rest);
                    target.home_streak = target.home_streak.or(Some(streak));
                }
                Side::Away => {
                    target.away_rest_days = target.away_rest_days.or(rest);
                    target.away_streak = target.away_streak.or(Some(streak));
                }
            }

            state.last_played = Some((record.season, record.date));
            if state.streak_season != record.season {
                state.streak_season = record.season;
                state.streak = 0;
            }
            if record.is_final() {
                state.streak = match record.winner() {
                    Some(winner) if winner == side => state.streak.max(0) + 1,
                    Some(_) => state.streak.min(0) - 1,
                    None => 0,
                };
            }
        }
    }

    out
}
