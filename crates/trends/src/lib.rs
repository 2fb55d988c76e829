//! Trend evaluation over game records.
//!
//! - [`evaluator`]: field resolution and filter operators
//! - [`aggregator`]: straight-up, ATS and over/under buckets
//! - [`query`]: scoped, ordered, limited query evaluation
//! - [`angles`]: the situational angle library

pub mod aggregator;
pub mod angles;
pub mod evaluator;
pub mod perspective;
pub mod query;

pub use aggregator::{Bucket, Market, Outcome, TrendAggregator, TrendSummary};
pub use angles::{angles_for, AngleCatalog, AngleMarket, AngleTemplate, Favors, SituationalAngle};
pub use evaluator::{matches, matches_all, resolve, verify_resolution_table, FieldValue};
pub use perspective::resolve_side;
pub use query::{evaluate_query, MatchedGame, QueryResult};
