use std::cell::RefCell;
use std::path::Path;

use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::game::{GameKind, Polarity};
use crate::scoring::{mean, BestMetric};
use crate::settings::ReportMap;

/// One persisted session outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub player_id: String,
    pub game_id: u32,
    pub settings: ReportMap,
    pub metrics: ReportMap,
    pub recorded_at: DateTime<Local>,
}

impl ResultRecord {
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied().filter(|v| v.is_finite())
    }
}

/// Where finished sessions are reported and personal bests come from.
pub trait ResultsStore {
    fn submit_result(
        &self,
        player_id: &str,
        game_id: u32,
        settings: &ReportMap,
        metrics: &ReportMap,
    ) -> Result<(), StoreError>;

    /// Records matching the given filters; `None` matches everything.
    fn query_results(
        &self,
        player_id: Option<&str>,
        game_id: Option<u32>,
    ) -> Result<Vec<ResultRecord>, StoreError>;
}

const CREATE_RESULTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id TEXT NOT NULL,
        game_id INTEGER NOT NULL,
        settings TEXT NOT NULL,
        metrics TEXT NOT NULL,
        recorded_at TEXT NOT NULL
    )
"#;

/// Results database backed by SQLite.
#[derive(Debug)]
pub struct SqliteResultsStore {
    conn: Connection,
}

impl SqliteResultsStore {
    /// Open the database at the default state location.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path()
            .ok_or_else(|| StoreError::Unavailable("no writable state directory".into()))?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_RESULTS_TABLE, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_player_game ON results(player_id, game_id)",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM results", [])?;
        Ok(())
    }
}

impl ResultsStore for SqliteResultsStore {
    fn submit_result(
        &self,
        player_id: &str,
        game_id: u32,
        settings: &ReportMap,
        metrics: &ReportMap,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO results (player_id, game_id, settings, metrics, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                player_id,
                game_id,
                serde_json::to_string(settings)?,
                serde_json::to_string(metrics)?,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn query_results(
        &self,
        player_id: Option<&str>,
        game_id: Option<u32>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT player_id, game_id, settings, metrics, recorded_at
            FROM results
            WHERE (?1 IS NULL OR player_id = ?1)
              AND (?2 IS NULL OR game_id = ?2)
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![player_id, game_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (player_id, game_id, settings, metrics, recorded_at) = row?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "recorded_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            records.push(ResultRecord {
                player_id,
                game_id,
                settings: serde_json::from_str(&settings)?,
                metrics: serde_json::from_str(&metrics)?,
                recorded_at,
            });
        }
        Ok(records)
    }
}

/// Keeps results for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryResultsStore {
    records: RefCell<Vec<ResultRecord>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl ResultsStore for MemoryResultsStore {
    fn submit_result(
        &self,
        player_id: &str,
        game_id: u32,
        settings: &ReportMap,
        metrics: &ReportMap,
    ) -> Result<(), StoreError> {
        self.records.borrow_mut().push(ResultRecord {
            player_id: player_id.to_string(),
            game_id,
            settings: settings.clone(),
            metrics: metrics.clone(),
            recorded_at: Local::now(),
        });
        Ok(())
    }

    fn query_results(
        &self,
        player_id: Option<&str>,
        game_id: Option<u32>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| player_id.map_or(true, |p| r.player_id == p))
            .filter(|r| game_id.map_or(true, |g| r.game_id == g))
            .cloned()
            .collect())
    }
}

/// Stand-in used when the real store could not be opened. Every call fails,
/// which the session treats like a network outage.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ResultsStore for UnavailableStore {
    fn submit_result(
        &self,
        _player_id: &str,
        _game_id: u32,
        _settings: &ReportMap,
        _metrics: &ReportMap,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn query_results(
        &self,
        _player_id: Option<&str>,
        _game_id: Option<u32>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

/// Best derived value this player has reached in `game`.
pub fn best_metric(store: &dyn ResultsStore, player_id: &str, game: GameKind) -> BestMetric {
    let records = match store.query_results(Some(player_id), Some(game.id())) {
        Ok(records) => records,
        Err(e) => {
            log::warn!("could not fetch best result for {player_id}: {e}");
            return BestMetric::Unavailable;
        }
    };

    let polarity = game.polarity();
    records
        .iter()
        .filter_map(|r| r.metric(game.derived_key()))
        .fold(None, |best: Option<f64>, v| match best {
            Some(b) if !polarity.prefers(v, b) => Some(b),
            _ => Some(v),
        })
        .map_or(BestMetric::NoHistory, BestMetric::Best)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub player_id: String,
    pub best: f64,
    pub mean: f64,
    pub sessions: usize,
    pub last_played: DateTime<Local>,
}

/// One row per player, best first according to the game's polarity.
pub fn leaderboard(
    store: &dyn ResultsStore,
    game: GameKind,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let key = game.derived_key();
    let polarity = game.polarity();

    let by_player = store
        .query_results(None, Some(game.id()))?
        .into_iter()
        .filter(|r| r.metric(key).is_some())
        .into_group_map_by(|r| r.player_id.clone());

    let entries = by_player
        .into_iter()
        .filter_map(|(player_id, records)| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.metric(key)).collect();
            let best = values
                .iter()
                .copied()
                .reduce(|a, b| if polarity.prefers(b, a) { b } else { a })?;
            let last_played = records.iter().map(|r| r.recorded_at).max()?;
            Some(LeaderboardEntry {
                player_id,
                best,
                mean: mean(&values)?,
                sessions: values.len(),
                last_played,
            })
        })
        .sorted_by(|a, b| {
            let ord = a
                .best
                .partial_cmp(&b.best)
                .unwrap_or(std::cmp::Ordering::Equal);
            let ord = match polarity {
                Polarity::LowerIsBetter => ord,
                Polarity::HigherIsBetter => ord.reverse(),
            };
            ord.then_with(|| a.player_id.cmp(&b.player_id))
        })
        .take(limit)
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> ReportMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn seed(store: &dyn ResultsStore) {
        let settings = metrics(&[("Setting1", 30.0)]);
        let rows: [(&str, u32, &[(&str, f64)]); 5] = [
            ("ann@example.com", 1, &[("Result1", 10.0), ("Result2", 3000.0)]),
            ("ann@example.com", 1, &[("Result1", 15.0), ("Result2", 2000.0)]),
            ("bob@example.com", 1, &[("Result1", 20.0), ("Result2", 1500.0)]),
            ("ann@example.com", 4, &[("Result1", 2.0), ("Result2", 2.0), ("Result3", 50.0)]),
            ("ann@example.com", 4, &[("Result1", 4.0), ("Result2", 0.0), ("Result3", 100.0)]),
        ];
        for (player, game_id, values) in rows {
            store.submit_result(player, game_id, &settings, &metrics(values)).unwrap();
        }
    }

    #[test]
    fn test_sqlite_round_trip_and_filters() {
        let store = SqliteResultsStore::in_memory().unwrap();
        seed(&store);

        assert_eq!(store.query_results(None, None).unwrap().len(), 5);
        assert_eq!(store.query_results(Some("ann@example.com"), None).unwrap().len(), 4);
        assert_eq!(store.query_results(None, Some(1)).unwrap().len(), 3);

        let ann_hunt = store
            .query_results(Some("ann@example.com"), Some(1))
            .unwrap();
        assert_eq!(ann_hunt.len(), 2);
        assert_eq!(ann_hunt[0].metric("Result2"), Some(3000.0));
        assert_eq!(ann_hunt[0].settings.get("Setting1"), Some(&30.0));
    }

    #[test]
    fn test_sqlite_clear() {
        let store = SqliteResultsStore::in_memory().unwrap();
        seed(&store);
        store.clear_all().unwrap();
        assert!(store.query_results(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_filters() {
        let store = MemoryResultsStore::new();
        assert!(store.is_empty());
        seed(&store);
        assert_eq!(store.len(), 5);
        assert_eq!(store.query_results(Some("bob@example.com"), Some(1)).unwrap().len(), 1);
        assert!(store.query_results(Some("bob@example.com"), Some(4)).unwrap().is_empty());
    }

    #[test]
    fn test_best_metric_respects_polarity() {
        let store = MemoryResultsStore::new();
        seed(&store);
        assert_eq!(
            best_metric(&store, "ann@example.com", GameKind::ItemHunt),
            BestMetric::Best(2000.0)
        );
        assert_eq!(
            best_metric(&store, "ann@example.com", GameKind::Monte),
            BestMetric::Best(100.0)
        );
        assert_eq!(
            best_metric(&store, "ann@example.com", GameKind::Stroop),
            BestMetric::NoHistory
        );
    }

    #[test]
    fn test_best_metric_skips_records_without_derived_value() {
        let store = MemoryResultsStore::new();
        store
            .submit_result(
                "cy@example.com",
                3,
                &ReportMap::new(),
                &metrics(&[("Result1", 0.0), ("Result2", 4.0)]),
            )
            .unwrap();
        assert_eq!(
            best_metric(&store, "cy@example.com", GameKind::Stroop),
            BestMetric::NoHistory
        );
    }

    #[test]
    fn test_best_metric_unavailable_store() {
        let store = UnavailableStore::new("offline");
        assert_eq!(
            best_metric(&store, "ann@example.com", GameKind::ItemHunt),
            BestMetric::Unavailable
        );
        assert!(store
            .submit_result("ann@example.com", 1, &ReportMap::new(), &ReportMap::new())
            .is_err());
    }

    #[test]
    fn test_leaderboard_orders_by_polarity() {
        let store = MemoryResultsStore::new();
        seed(&store);

        let board = leaderboard(&store, GameKind::ItemHunt, 10).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player_id, "bob@example.com");
        assert_eq!(board[0].best, 1500.0);
        assert_eq!(board[1].player_id, "ann@example.com");
        assert_eq!(board[1].best, 2000.0);
        assert_eq!(board[1].mean, 2500.0);
        assert_eq!(board[1].sessions, 2);

        let board = leaderboard(&store, GameKind::ItemHunt, 1).unwrap();
        assert_eq!(board.len(), 1);

        let board = leaderboard(&store, GameKind::Monte, 10).unwrap();
        assert_eq!(board[0].best, 100.0);
    }
}
