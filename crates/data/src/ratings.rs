//! External efficiency ratings and their time-boxed cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use trend_engine_core::Sport;

use crate::error::DataError;

/// Team ratings published by one source for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub source: String,
    pub season: i32,
    /// Keyed by lower-cased team name.
    ratings: HashMap<String, f64>,
}

impl RatingTable {
    #[must_use]
    pub fn new(source: impl Into<String>, season: i32) -> Self {
        Self {
            source: source.into(),
            season,
            ratings: HashMap::new(),
        }
    }

    pub fn insert(&mut self, team: &str, rating: f64) {
        self.ratings.insert(team.trim().to_lowercase(), rating);
    }

    #[must_use]
    pub fn with_rating(mut self, team: &str, rating: f64) -> Self {
        self.insert(team, rating);
        self
    }

    /// Rating for a team, matched case-insensitively.
    #[must_use]
    pub fn get(&self, team: &str) -> Option<f64> {
        self.ratings.get(&team.trim().to_lowercase()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Provider of per-season team ratings.
#[async_trait]
pub trait RatingSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, season: i32) -> Result<RatingTable, DataError>;
}

#[derive(Debug, Deserialize)]
struct RatingEntry {
    team: String,
    rating: f64,
}

/// Ratings served as JSON by an HTTP endpoint:
/// `GET {base_url}/ratings?sport={SPORT}&season={season}` returning
/// `[{"team": "...", "rating": 12.3}, ...]`.
#[derive(Debug, Clone)]
pub struct HttpRatingSource {
    name: String,
    base_url: String,
    sport: Sport,
    client: reqwest::Client,
}

impl HttpRatingSource {
    /// Creates a source with a request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        sport: Sport,
        timeout: std::time::Duration,
    ) -> Result<Self, DataError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::from_reqwest(&name, &e))?;
        Ok(Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sport,
            client,
        })
    }
}

#[async_trait]
impl RatingSource for HttpRatingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, season: i32) -> Result<RatingTable, DataError> {
        let url = format!("{}/ratings", self.base_url);
        let season_param = season.to_string();
        let entries: Vec<RatingEntry> = self
            .client
            .get(&url)
            .query(&[("sport", self.sport.code()), ("season", season_param.as_str())])
            .send()
            .await
            .map_err(|e| DataError::from_reqwest(&self.name, &e))?
            .error_for_status()
            .map_err(|e| DataError::from_reqwest(&self.name, &e))?
            .json()
            .await
            .map_err(|e| DataError::from_reqwest(&self.name, &e))?;

        let mut table = RatingTable::new(self.name.clone(), season);
        for entry in entries {
            if entry.rating.is_finite() {
                table.insert(&entry.team, entry.rating);
            } else {
                tracing::warn!(source = %self.name, team = %entry.team, "ignoring non-finite rating");
            }
        }
        Ok(table)
    }
}

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock advanced by hand, for expiry tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    start: DateTime<Utc>,
    offset_secs: AtomicI64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            offset_secs: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.offset_secs.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

type CacheKey = (String, i32);

/// Rating tables keyed by (source, season) with a fixed time-to-live.
///
/// A read inside the validity window never refetches. A miss fetches once
/// and seeds the entry for every later caller; concurrent misses may fetch
/// redundantly, and the last write wins.
pub struct RatingCache<C: Clock = SystemClock> {
    entries: RwLock<HashMap<CacheKey, (Arc<RatingTable>, DateTime<Utc>)>>,
    ttl: Duration,
    clock: C,
}

impl RatingCache<SystemClock> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> RatingCache<C> {
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached table or fetches it on a miss or after expiry.
    ///
    /// # Errors
    /// Propagates the source's failure; nothing is cached in that case.
    pub async fn get(
        &self,
        source: &dyn RatingSource,
        season: i32,
    ) -> Result<Arc<RatingTable>, DataError> {
        let key = (source.name().to_string(), season);

        {
            let entries = self.entries.read().await;
            if let Some((table, fetched_at)) = entries.get(&key) {
                if self.clock.now() - *fetched_at < self.ttl {
                    return Ok(Arc::clone(table));
                }
            }
        }

        tracing::debug!(source = %key.0, season, "rating cache miss");
        let table = Arc::new(source.fetch(season).await?);
        let fetched_at = self.clock.now();

        {
            let mut entries = self.entries.write().await;
            entries.insert(key, (Arc::clone(&table), fetched_at));
        }

        tracing::info!(source = %table.source, season, teams = table.len(), "refreshed rating table");
        Ok(table)
    }

    /// Drops one entry.
    pub async fn invalidate(&self, source: &str, season: i32) {
        self.entries
            .write()
            .await
            .remove(&(source.to_string(), season));
    }

    /// Number of entries, live or expired.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingSource {
        name: String,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RatingSource for CountingSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self, season: i32) -> Result<RatingTable, DataError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::Network {
                    provider: self.name.clone(),
                    message: "down".to_string(),
                    timed_out: true,
                });
            }
            #[allow(clippy::cast_precision_loss)]
            Ok(RatingTable::new(self.name.clone(), season).with_rating("KC", n as f64))
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-09-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    // ============================================
    // Cache
    // ============================================

    #[tokio::test]
    async fn hit_inside_ttl_does_not_refetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = RatingCache::with_clock(Duration::minutes(10), Arc::clone(&clock));
        let source = CountingSource::new("kenpom");

        let first = cache.get(&source, 2024).await.unwrap();
        clock.advance(Duration::minutes(9));
        let second = cache.get(&source, 2024).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn expiry_triggers_one_refetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = RatingCache::with_clock(Duration::minutes(10), Arc::clone(&clock));
        let source = CountingSource::new("kenpom");

        cache.get(&source, 2024).await.unwrap();
        clock.advance(Duration::minutes(10));
        let refreshed = cache.get(&source, 2024).await.unwrap();
        cache.get(&source, 2024).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed.get("kc"), Some(1.0));
    }

    #[tokio::test]
    async fn keys_are_per_source_and_season() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = RatingCache::with_clock(Duration::hours(1), clock);
        let a = CountingSource::new("a");
        let b = CountingSource::new("b");

        cache.get(&a, 2023).await.unwrap();
        cache.get(&a, 2024).await.unwrap();
        cache.get(&b, 2024).await.unwrap();

        assert_eq!(a.calls(), 2);
        assert_eq!(b.calls(), 1);
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = RatingCache::new(Duration::hours(1));
        let mut source = CountingSource::new("flaky");
        source.fail = true;

        let err = cache.get(&source, 2024).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = RatingCache::new(Duration::hours(1));
        let source = CountingSource::new("sagarin");

        cache.get(&source, 2024).await.unwrap();
        cache.invalidate("sagarin", 2024).await;
        cache.get(&source, 2024).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let table = RatingTable::new("x", 2024).with_rating(" Kansas City ", 7.5);
        assert_eq!(table.get("kansas city"), Some(7.5));
        assert_eq!(table.get("Denver"), None);
    }

    // ============================================
    // HTTP source
    // ============================================

    #[tokio::test]
    async fn http_source_parses_ratings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ratings"))
            .and(query_param("sport", "NCAAB"))
            .and(query_param("season", "2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"team": "Houston", "rating": 31.2},
                {"team": "Purdue", "rating": 29.8}
            ])))
            .mount(&server)
            .await;

        let source = HttpRatingSource::new(
            "efficiency",
            server.uri(),
            Sport::Ncaab,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let table = source.fetch(2024).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("houston"), Some(31.2));
        assert_eq!(table.source, "efficiency");
    }

    #[tokio::test]
    async fn http_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpRatingSource::new(
            "efficiency",
            server.uri(),
            Sport::Nfl,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let err = source.fetch(2024).await.unwrap_err();
        assert!(matches!(err, DataError::Http { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn http_not_found_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpRatingSource::new(
            "efficiency",
            server.uri(),
            Sport::Nfl,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let err = source.fetch(1900).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
