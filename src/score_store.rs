use crate::app_dirs::AppDirs;
use chrono::Local;
use itertools::Itertools;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sequence name backing score record ids. Other record kinds get their own
/// counter row.
pub const SCORES_SEQUENCE: &str = "scores";

pub const DEFAULT_RANKING_LIMIT: usize = 10;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Submission rejected before anything was allocated or written.
    #[error("{0}")]
    Validation(String),
    /// The underlying store failed; safe to retry from the caller.
    #[error("score store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
}

/// A persisted session result. Immutable once written; `id` comes from the
/// `scores` sequence and is never reused, even if the record goes away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub id: u64,
    pub owner: String,
    pub score: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub created_at: String,
}

/// Submission body shape: every field must be present and finite, otherwise
/// the whole submission is rejected with no id consumed.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoreSubmission {
    pub score: Option<f64>,
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
}

impl ScoreSubmission {
    pub fn new(score: f64, wpm: f64, accuracy: f64) -> Self {
        Self {
            score: Some(score),
            wpm: Some(wpm),
            accuracy: Some(accuracy),
        }
    }

    fn validated(self) -> Result<(f64, f64, f64), StoreError> {
        let field = |value: Option<f64>, name: &str| -> Result<f64, StoreError> {
            let value =
                value.ok_or_else(|| StoreError::Validation(format!("missing field `{name}`")))?;
            if !value.is_finite() {
                return Err(StoreError::Validation(format!(
                    "field `{name}` must be a finite number"
                )));
            }
            Ok(value)
        };

        Ok((
            field(self.score, "score")?,
            field(self.wpm, "wpm")?,
            field(self.accuracy, "accuracy")?,
        ))
    }
}

/// SQLite-backed score aggregator: named id sequences plus score records
/// keyed by `(owner, id)`.
#[derive(Debug)]
pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    /// Open (and initialize if needed) the store at `path`. Several
    /// connections may point at the same file; SQLite serializes the writes
    /// and the busy timeout covers lock contention.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("failed to create directory: {e}")),
                )
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        Self::init(&conn)?;
        Ok(Self { conn })
    }

    /// Store under the default state directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quik_scores.db"));
        Self::open(path)
    }

    /// Throwaway store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                owner TEXT NOT NULL,
                id INTEGER NOT NULL,
                score REAL NOT NULL,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (owner, id)
            )
            "#,
            [],
        )?;

        Ok(())
    }

    /// Atomically increment the named counter and return the new value.
    /// The upsert-increment is a single statement, so two concurrent callers
    /// can never see the same value. Failures leave the counter untouched.
    pub fn allocate_id(&self, sequence: &str) -> Result<u64, StoreError> {
        let value: i64 = self.conn.query_row(
            r#"
            INSERT INTO counters (name, value) VALUES (?1, 1)
            ON CONFLICT(name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
            params![sequence],
            |row| row.get(0),
        )?;

        Ok(value as u64)
    }

    /// Validate, allocate an id, stamp the creation time, and write the
    /// record. A failure after allocation leaves a gap in the sequence,
    /// which is fine; a duplicate id is not possible.
    pub fn submit_score(
        &self,
        owner: &str,
        submission: ScoreSubmission,
    ) -> Result<ScoreRecord, StoreError> {
        let (score, wpm, accuracy) = submission.validated()?;

        let id = self.allocate_id(SCORES_SEQUENCE)?;
        let created_at = Local::now().to_rfc3339();

        self.conn.execute(
            r#"
            INSERT INTO scores (owner, id, score, wpm, accuracy, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![owner, id as i64, score, wpm, accuracy, created_at],
        )?;

        Ok(ScoreRecord {
            id,
            owner: owner.to_string(),
            score,
            wpm,
            accuracy,
            created_at,
        })
    }

    /// Top `limit` records across all owners, by wpm descending. Full scan
    /// plus an in-memory stable sort; ties keep their scan order. Fine at
    /// this scale.
    pub fn ranking(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let records = self.scan(None)?;
        Ok(records
            .into_iter()
            .sorted_by(|a, b| b.wpm.partial_cmp(&a.wpm).unwrap_or(Ordering::Equal))
            .take(limit)
            .collect())
    }

    /// All of one owner's records, in storage iteration order.
    pub fn history(&self, owner: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        self.scan(Some(owner))
    }

    fn scan(&self, owner: Option<&str>) -> Result<Vec<ScoreRecord>, StoreError> {
        let (sql, filter) = match owner {
            Some(owner) => (
                "SELECT owner, id, score, wpm, accuracy, created_at FROM scores WHERE owner = ?1",
                vec![owner],
            ),
            None => (
                "SELECT owner, id, score, wpm, accuracy, created_at FROM scores",
                vec![],
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(filter), |row| {
            Ok(ScoreRecord {
                owner: row.get(0)?,
                id: row.get::<_, i64>(1)? as u64,
                score: row.get(2)?,
                wpm: row.get(3)?,
                accuracy: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}
