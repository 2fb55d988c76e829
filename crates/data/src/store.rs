//! Record Store Adapters.
//!
//! Every adapter returns the records matching a [`RecordScope`] ordered by
//! date, then id, so downstream evaluation is deterministic.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::path::{Path, PathBuf};
use trend_engine_core::{GameRecord, SeasonRange, Sport, TrendQuery};

use crate::error::DataError;

/// Coarse constraints pushed down to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScope {
    pub sport: Sport,
    pub seasons: Option<SeasonRange>,
    pub team: Option<String>,
}

impl RecordScope {
    #[must_use]
    pub fn new(sport: Sport) -> Self {
        Self {
            sport,
            seasons: None,
            team: None,
        }
    }

    #[must_use]
    pub fn with_seasons(mut self, seasons: SeasonRange) -> Self {
        self.seasons = Some(seasons);
        self
    }

    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Scope covering everything a query can match.
    #[must_use]
    pub fn for_query(query: &TrendQuery) -> Self {
        Self {
            sport: query.sport(),
            seasons: query.seasons(),
            team: query.team().map(str::to_string),
        }
    }

    #[must_use]
    pub fn matches(&self, record: &GameRecord) -> bool {
        record.sport == self.sport
            && self.seasons.map_or(true, |range| range.contains(record.season))
            && self
                .team
                .as_deref()
                .map_or(true, |team| record.side_of(team).is_some())
    }
}

/// Source of historical and scheduled game records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Adapter name used in logs and errors.
    fn name(&self) -> &str;

    /// Fetches records in scope, ordered by date then id.
    async fn fetch(&self, scope: &RecordScope) -> Result<Vec<GameRecord>, DataError>;
}

fn sort_records(records: &mut [GameRecord]) {
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<GameRecord>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new(mut records: Vec<GameRecord>) -> Self {
        sort_records(&mut records);
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, scope: &RecordScope) -> Result<Vec<GameRecord>, DataError> {
        Ok(self
            .records
            .iter()
            .filter(|r| scope.matches(r))
            .cloned()
            .collect())
    }
}

/// Records loaded once from a JSON array or CSV file, chosen by extension.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
    inner: MemoryRecordStore,
}

impl FileRecordStore {
    /// Loads every record in the file.
    ///
    /// CSV rows that fail to decode are skipped with a warning; a malformed
    /// JSON document fails the whole load.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, has an unknown extension,
    /// or is not a valid JSON array.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        let path_display = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let records = match extension.as_str() {
            "json" => {
                let text = std::fs::read_to_string(&path).map_err(|source| DataError::Io {
                    path: path_display.clone(),
                    source,
                })?;
                serde_json::from_str::<Vec<GameRecord>>(&text)?
            }
            "csv" => Self::read_csv(&path, &path_display)?,
            other => return Err(DataError::UnsupportedFormat(format!("{path_display} ({other})"))),
        };

        tracing::info!(path = %path_display, records = records.len(), "loaded game records");
        Ok(Self {
            path,
            inner: MemoryRecordStore::new(records),
        })
    }

    fn read_csv(path: &Path, path_display: &str) -> Result<Vec<GameRecord>, DataError> {
        let file = std::fs::File::open(path).map_err(|source| DataError::Io {
            path: path_display.to_string(),
            source,
        })?;
        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        let mut skipped = 0_usize;

        for (row, result) in reader.deserialize::<GameRecord>().enumerate() {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(path = %path_display, row = row + 1, error = %err, "skipping unreadable row");
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(path = %path_display, skipped, "some rows could not be read");
        }
        Ok(records)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, scope: &RecordScope) -> Result<Vec<GameRecord>, DataError> {
        self.inner.fetch(scope).await
    }
}

/// One row of the `games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    pub id: String,
    pub sport: String,
    pub season: i32,
    pub week: Option<i32>,
    pub game_date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub home_moneyline: Option<i32>,
    pub away_moneyline: Option<i32>,
    pub spread_result: Option<String>,
    pub total_result: Option<String>,
    pub is_conference_game: bool,
    pub is_division_game: bool,
    pub is_playoff: bool,
    pub is_neutral_site: bool,
    pub is_primetime: bool,
    pub is_dome: bool,
    pub home_rest_days: Option<i32>,
    pub away_rest_days: Option<i32>,
    pub home_rating: Option<f64>,
    pub away_rating: Option<f64>,
    pub home_rank: Option<i32>,
    pub away_rank: Option<i32>,
    pub home_streak: Option<i32>,
    pub away_streak: Option<i32>,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather_condition: Option<String>,
}

fn non_negative(id: &str, column: &str, value: Option<i32>) -> Result<Option<u32>, DataError> {
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| DataError::InvalidRecord {
                id: id.to_string(),
                reason: format!("{column} is negative ({v})"),
            })
        })
        .transpose()
}

impl TryFrom<GameRow> for GameRecord {
    type Error = DataError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| DataError::InvalidRecord {
            id: row.id.clone(),
            reason,
        };

        let sport: Sport = row.sport.parse().map_err(|e: String| invalid(e))?;
        let spread_result = row
            .spread_result
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| invalid(e))?;
        let total_result = row
            .total_result
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| invalid(e))?;

        Ok(GameRecord {
            week: non_negative(&row.id, "week", row.week)?,
            home_score: non_negative(&row.id, "home_score", row.home_score)?,
            away_score: non_negative(&row.id, "away_score", row.away_score)?,
            home_rest_days: non_negative(&row.id, "home_rest_days", row.home_rest_days)?,
            away_rest_days: non_negative(&row.id, "away_rest_days", row.away_rest_days)?,
            home_rank: non_negative(&row.id, "home_rank", row.home_rank)?,
            away_rank: non_negative(&row.id, "away_rank", row.away_rank)?,
            id: row.id,
            sport,
            season: row.season,
            date: row.game_date,
            home_team: row.home_team,
            away_team: row.away_team,
            spread: row.spread,
            total: row.total,
            home_moneyline: row.home_moneyline,
            away_moneyline: row.away_moneyline,
            spread_result,
            total_result,
            is_conference_game: row.is_conference_game,
            is_division_game: row.is_division_game,
            is_playoff: row.is_playoff,
            is_neutral_site: row.is_neutral_site,
            is_primetime: row.is_primetime,
            is_dome: row.is_dome,
            home_rating: row.home_rating,
            away_rating: row.away_rating,
            home_streak: row.home_streak,
            away_streak: row.away_streak,
            temperature: row.temperature,
            wind_speed: row.wind_speed,
            weather_condition: row.weather_condition,
        })
    }
}

/// `PostgreSQL` adapter over the `games` table.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connects to the database.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DataError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn fetch(&self, scope: &RecordScope) -> Result<Vec<GameRecord>, DataError> {
        let rows = sqlx::query_as::<_, GameRow>(
            r"
            SELECT id, sport, season, week, game_date, home_team, away_team,
                   home_score, away_score, spread, total, home_moneyline, away_moneyline,
                   spread_result, total_result, is_conference_game, is_division_game,
                   is_playoff, is_neutral_site, is_primetime, is_dome,
                   home_rest_days, away_rest_days, home_rating, away_rating,
                   home_rank, away_rank, home_streak, away_streak,
                   temperature, wind_speed, weather_condition
            FROM games
            WHERE sport = $1
              AND ($2::int IS NULL OR season >= $2)
              AND ($3::int IS NULL OR season <= $3)
              AND ($4::text IS NULL OR lower(home_team) = lower($4) OR lower(away_team) = lower($4))
            ORDER BY game_date ASC, id ASC
            ",
        )
        .bind(scope.sport.code())
        .bind(scope.seasons.map(|r| r.start))
        .bind(scope.seasons.map(|r| r.end))
        .bind(scope.team.as_deref())
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(sport = %scope.sport, rows = rows.len(), "fetched game rows");
        rows.into_iter().map(GameRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trend_engine_core::SpreadResult;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn game(id: &str, sport: Sport, season: i32, day: u32, home: &str, away: &str) -> GameRecord {
        GameRecord::scheduled(id, sport, season, date(season, 10, day), home, away)
    }

    // ============================================
    // Scope
    // ============================================

    #[tokio::test]
    async fn memory_store_applies_scope_and_orders_by_date() {
        let store = MemoryRecordStore::new(vec![
            game("c", Sport::Nfl, 2023, 20, "KC", "BUF"),
            game("a", Sport::Nfl, 2023, 5, "BUF", "MIA"),
            game("b", Sport::Nba, 2023, 6, "BOS", "NYK"),
            game("d", Sport::Nfl, 2021, 1, "KC", "DEN"),
        ]);

        let scope = RecordScope::new(Sport::Nfl).with_seasons(SeasonRange::new(2022, 2023).unwrap());
        let ids: Vec<_> = store
            .fetch(&scope)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        let scope = RecordScope::new(Sport::Nfl).with_team("kc");
        let ids: Vec<_> = store
            .fetch(&scope)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["d", "c"]);
    }

    // ============================================
    // Files
    // ============================================

    #[tokio::test]
    async fn loads_json_records() {
        let mut g = game("g1", Sport::Nfl, 2023, 1, "KC", "DET");
        g.spread = Some(-6.5);
        g.spread_result = Some(SpreadResult::Lost);
        let json = serde_json::to_string(&vec![g.clone()]).unwrap();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = FileRecordStore::open(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        let records = store.fetch(&RecordScope::new(Sport::Nfl)).await.unwrap();
        assert_eq!(records, vec![g]);
    }

    #[tokio::test]
    async fn loads_csv_records_and_skips_bad_rows() {
        let csv = "\
id,sport,season,date,homeTeam,awayTeam,homeScore,awayScore,spread,total,spreadResult,totalResult,isPrimetime
g1,NFL,2023,2023-09-07,KC,DET,20,21,-6.5,53.5,LOST,UNDER,true
g2,NFL,2023,2023-09-10,BUF,NYJ,,,-2.5,,,,false
g3,NFL,2023,not-a-date,MIA,LAC,36,34,3,51,COVERED,OVER,false
";
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(csv.as_bytes()).unwrap();

        let store = FileRecordStore::open(file.path()).unwrap();
        assert_eq!(store.len(), 2);

        let records = store.fetch(&RecordScope::new(Sport::Nfl)).await.unwrap();
        assert_eq!(records[0].id, "g1");
        assert!(records[0].is_primetime);
        assert_eq!(records[0].home_score, Some(20));
        assert_eq!(records[1].home_score, None);
        assert_eq!(records[1].total, None);
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        let err = FileRecordStore::open(file.path()).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FileRecordStore::open("/nonexistent/games.json").unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
        assert!(!err.is_retryable());
    }

    // ============================================
    // Row mapping
    // ============================================

    fn row() -> GameRow {
        GameRow {
            id: "r1".to_string(),
            sport: "NFL".to_string(),
            season: 2023,
            week: Some(1),
            game_date: date(2023, 9, 7),
            home_team: "KC".to_string(),
            away_team: "DET".to_string(),
            home_score: Some(20),
            away_score: Some(21),
            spread: Some(-6.5),
            total: Some(53.5),
            home_moneyline: Some(-270),
            away_moneyline: Some(220),
            spread_result: Some("LOST".to_string()),
            total_result: Some("UNDER".to_string()),
            is_conference_game: false,
            is_division_game: false,
            is_playoff: false,
            is_neutral_site: false,
            is_primetime: true,
            is_dome: false,
            home_rest_days: None,
            away_rest_days: None,
            home_rating: None,
            away_rating: None,
            home_rank: None,
            away_rank: None,
            home_streak: None,
            away_streak: None,
            temperature: Some(71.0),
            wind_speed: None,
            weather_condition: None,
        }
    }

    #[test]
    fn row_maps_to_record() {
        let record = GameRecord::try_from(row()).unwrap();
        assert_eq!(record.sport, Sport::Nfl);
        assert_eq!(record.spread_result, Some(SpreadResult::Lost));
        assert_eq!(record.away_score, Some(21));
        assert!(record.is_primetime);
    }

    #[test]
    fn row_with_negative_score_is_rejected() {
        let mut bad = row();
        bad.home_score = Some(-1);
        let err = GameRecord::try_from(bad).unwrap_err();
        assert!(matches!(err, DataError::InvalidRecord { .. }));
    }

    #[test]
    fn row_with_unknown_settlement_is_rejected() {
        let mut bad = row();
        bad.spread_result = Some("WON".to_string());
        assert!(GameRecord::try_from(bad).is_err());
    }
}
