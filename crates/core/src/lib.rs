//! Core types for the trend engine: game records, the queryable field
//! whitelist, validated trend queries, significance testing, stake sizing,
//! tier rule tables and configuration.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod field;
pub mod kelly;
pub mod query;
pub mod record;
pub mod rules;
pub mod significance;
pub mod sport;

pub use config::{
    CacheConfig, EngineConfig, ParlayConfig, ScoringConfig, StoreConfig, TeaserConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{EngineError, ValidationError};
pub use field::{Field, FieldKind, WHITELIST_VERSION};
pub use kelly::{BetDecision, BetReason, KellySizer};
pub use query::{
    Filter, FilterValue, Operator, Perspective, QueryOrder, Scalar, SeasonRange, TrendQuery,
};
pub use record::{GameRecord, Side, Sport, SpreadResult, TotalResult};
pub use rules::{RuleTable, TierInputs, TierRule};
pub use significance::{compute_significance, SignificanceResult, Strength};
pub use sport::SportConfig;
