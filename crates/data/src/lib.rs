//! External collaborators of the trend engine.
//!
//! This crate provides:
//! - Record Store Adapters (in-memory, JSON/CSV files, `PostgreSQL`)
//! - Rating sources and a time-boxed rating cache with an injectable clock
//! - Enrichment that merges ratings and schedule-derived attributes onto records

pub mod enrich;
pub mod error;
pub mod ratings;
pub mod store;

pub use enrich::{derive_schedule_attributes, enrich_records};
pub use error::DataError;
pub use ratings::{
    Clock, HttpRatingSource, ManualClock, RatingCache, RatingSource, RatingTable, SystemClock,
};
pub use store::{FileRecordStore, MemoryRecordStore, PgRecordStore, RecordScope, RecordStore};
