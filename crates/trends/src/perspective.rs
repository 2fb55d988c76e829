//! Perspective resolution: which side of a record a query looks from.

use trend_engine_core::{GameRecord, Perspective, Side};

/// Resolves a perspective to a concrete side of `record`.
///
/// Returns `None` when the side cannot be determined: a favorite or
/// underdog view of a pick'em or unlined game, or a team that did not play.
#[must_use]
pub fn resolve_side(record: &GameRecord, perspective: Perspective, team: Option<&str>) -> Option<Side> {
    match perspective {
        Perspective::Home => Some(Side::Home),
        Perspective::Away => Some(Side::Away),
        Perspective::Favorite => record.favorite(),
        Perspective::Underdog => record.favorite().map(Side::opposite),
        Perspective::Team => team.and_then(|t| record.side_of(t)),
        Perspective::Opponent => team.and_then(|t| record.side_of(t)).map(Side::opposite),
    }
}
