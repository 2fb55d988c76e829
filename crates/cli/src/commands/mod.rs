//! CLI commands for the trend engine.

pub mod angles;
pub mod betting;
pub mod info;
pub mod output;
pub mod query;
pub mod records;
pub mod tiers;

pub use angles::{run_angles, run_pick, AnglesArgs, PickArgs};
pub use betting::{run_parlay, run_teaser, ParlayArgs, TeaserArgs};
pub use info::{run_fields, run_show_config};
pub use output::OutputFormat;
pub use query::{run_query, run_significance, QueryArgs, SignificanceArgs};
pub use tiers::{run_backtest_tiers, BacktestTiersArgs};
