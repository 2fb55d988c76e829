//! Record loading for commands that read history.
//!
//! Records come from a file (`--records` or `store.records_path`) or from
//! Postgres (`--db-url` or `store.database_url`). Schedule attributes are
//! derived for the sport, and ratings are merged when a rating service is
//! given.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use trend_engine_core::{EngineConfig, EngineError, GameRecord, SportConfig};
use trend_engine_data::{
    derive_schedule_attributes, enrich_records, FileRecordStore, HttpRatingSource,
    PgRecordStore, RatingCache, RecordScope, RecordStore,
};

/// Where records and ratings come from.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// JSON or CSV file of game records (overrides store.records_path)
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Database connection URL (overrides store.database_url)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// Base URL of a rating service to merge team ratings from
    #[arg(long, env = "TREND_RATINGS_URL")]
    pub ratings_url: Option<String>,

    /// Rating request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub ratings_timeout_secs: u64,
}

async fn open_store(args: &RecordArgs, config: &EngineConfig) -> Result<Box<dyn RecordStore>> {
    let path = args
        .records
        .clone()
        .or_else(|| config.store.records_path.as_ref().map(PathBuf::from));
    if let Some(path) = path {
        let store = FileRecordStore::open(&path)
            .with_context(|| format!("opening record file {}", path.display()))?;
        return Ok(Box::new(store));
    }

    let url = args
        .db_url
        .clone()
        .or_else(|| config.store.database_url.clone())
        .ok_or_else(|| {
            anyhow!("no record source: pass --records, --db-url, or set store.records_path")
        })?;
    let store = PgRecordStore::connect(&url, config.store.max_connections)
        .await
        .map_err(EngineError::from)
        .context("connecting to record database")?;
    Ok(Box::new(store))
}

/// Fetches records in `scope` and enriches them.
///
/// # Errors
/// Returns an error if the store or rating service fails; the error says
/// whether a retry may succeed.
pub async fn load_records(
    args: &RecordArgs,
    config: &EngineConfig,
    scope: &RecordScope,
) -> Result<Vec<GameRecord>> {
    let store = open_store(args, config).await?;
    let records = store
        .fetch(scope)
        .await
        .map_err(EngineError::from)
        .with_context(|| format!("fetching records from {}", store.name()))?;
    tracing::info!(store = store.name(), sport = %scope.sport, records = records.len(), "loaded records");

    let mut records = derive_schedule_attributes(&records, &SportConfig::for_sport(scope.sport));

    if let Some(url) = &args.ratings_url {
        let source = HttpRatingSource::new(
            "ratings",
            url.as_str(),
            scope.sport,
            std::time::Duration::from_secs(args.ratings_timeout_secs),
        )?;
        let ttl = i64::try_from(config.cache.rating_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| anyhow!("cache.rating_ttl_secs is out of range"))?;
        let cache = RatingCache::new(ttl);

        let seasons: BTreeSet<i32> = records.iter().map(|r| r.season).collect();
        for season in seasons {
            let table = cache
                .get(&source, season)
                .await
                .map_err(EngineError::from)
                .with_context(|| format!("fetching {season} ratings"))?;
            records = enrich_records(&records, &table);
        }
    }

    Ok(records)
}
