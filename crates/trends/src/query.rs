//! Query evaluation: scope, filters, ordering and limit over a record set.

use serde::{Deserialize, Serialize};
use trend_engine_core::{GameRecord, QueryOrder, Side, TrendQuery};

use crate::aggregator::{summarize, TrendSummary};
use crate::evaluator::matches_all;
use crate::perspective::resolve_side;

/// A record that satisfied a query, with the side it was evaluated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedGame {
    pub side: Side,
    pub team: String,
    pub record: GameRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub summary: TrendSummary,
    pub games: Vec<MatchedGame>,
    /// Records examined before the scan finished.
    pub scanned: usize,
}

fn in_scope(query: &TrendQuery, record: &GameRecord) -> bool {
    record.sport == query.sport()
        && query.seasons().map_or(true, |r| r.contains(record.season))
        && query.team().map_or(true, |t| record.side_of(t).is_some())
}

/// Evaluates a validated query against `records`.
///
/// Records outside the query's sport, season range or team are skipped, as
/// are records whose perspective side cannot be resolved (a favorite view of
/// a pick'em). Without an ordering the limit stops the scan at the first
/// `limit` matches in input order; with one, all matches are sorted by date
/// before the limit is applied.
#[must_use]
pub fn evaluate_query(query: &TrendQuery, records: &[GameRecord]) -> QueryResult {
    let perspective = query.perspective();
    let team = query.team();
    let mut matched: Vec<(&GameRecord, Side)> = Vec::new();
    let mut scanned = 0;

    for record in records {
        if query.order().is_none() && query.limit().is_some_and(|l| matched.len() >= l) {
            break;
        }
        scanned += 1;
        if !in_scope(query, record) {
            continue;
        }
        let Some(side) = resolve_side(record, perspective, team) else {
            continue;
        };
        if matches_all(query.filters(), record, Some(side)) {
            matched.push((record, side));
        }
    }

    match query.order() {
        Some(QueryOrder::Newest) => {
            matched.sort_by(|a, b| b.0.date.cmp(&a.0.date).then_with(|| a.0.id.cmp(&b.0.id)));
        }
        Some(QueryOrder::Oldest) => {
            matched.sort_by(|a, b| a.0.date.cmp(&b.0.date).then_with(|| a.0.id.cmp(&b.0.id)));
        }
        None => {}
    }
    if let Some(limit) = query.limit() {
        matched.truncate(limit);
    }

    let summary = summarize(perspective, matched.iter().copied());
    tracing::debug!(
        sport = %query.sport(),
        filters = query.filters().len(),
        scanned,
        matched = matched.len(),
        "evaluated trend query"
    );

    QueryResult {
        summary,
        games: matched
            .into_iter()
            .map(|(record, side)| MatchedGame {
                side,
                team: record.team(side).to_string(),
                record: record.clone(),
            })
            .collect(),
        scanned,
    }
}
