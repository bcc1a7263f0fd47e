//! SQLite persistence for long-term experiences.
//!
//! One row per experience key. State vectors are stored as JSON text and
//! datetimes as RFC 3339. Rows load back in insertion order (`rowid`), which
//! keeps relevance tie-breaking stable across a save/restore cycle.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::memory::long_term::MemoryRecord;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS experiences (
    key TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    meaning TEXT NOT NULL,
    performance REAL NOT NULL,
    datetime TEXT NOT NULL
)";

const UPSERT: &str = "INSERT INTO experiences (key, state, meaning, performance, datetime)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(key) DO UPDATE SET
        state = excluded.state,
        meaning = excluded.meaning,
        performance = excluded.performance,
        datetime = excluded.datetime";

const SELECT_ALL: &str =
    "SELECT key, state, meaning, performance, datetime FROM experiences ORDER BY rowid ASC";

/// SQLite-backed store of [`MemoryRecord`]s.
#[derive(Debug, Clone)]
pub struct LtmSqliteStorage {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Whether to log failures at error level.
    verbose: bool,
}

impl LtmSqliteStorage {
    /// Open (creating if needed) the database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the database file. Parent directories are created.
    /// * `verbose` - Whether to log failures at error level.
    pub fn new(db_path: impl AsRef<Path>, verbose: bool) -> Result<Self, anyhow::Error> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let storage = Self { db_path, verbose };
        storage.initialize_db()?;
        Ok(storage)
    }

    fn open(&self, action: &str) -> Result<Connection, anyhow::Error> {
        open_connection(&self.db_path, self.verbose, action)
    }

    fn initialize_db(&self) -> Result<(), anyhow::Error> {
        let conn = self.open("database initialization")?;
        conn.execute(CREATE_TABLE, [])?;
        Ok(())
    }

    /// Insert or replace the experience stored under `key`.
    pub fn save(&self, key: &str, record: &MemoryRecord) -> Result<(), anyhow::Error> {
        let conn = self.open("saving an experience")?;
        write_record(&conn, key, record)
    }

    /// Insert or replace many experiences in one transaction.
    ///
    /// Either every record is written or none is. Returns the number written.
    pub fn save_all<'a, I>(&self, records: I) -> Result<usize, anyhow::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a MemoryRecord)>,
    {
        let mut conn = self.open("saving experiences")?;
        let tx = conn.transaction()?;
        let mut written = 0;
        for (key, record) in records {
            if let Err(e) = write_record(&tx, key, record) {
                if self.verbose {
                    log::error!(
                        "MEMORY ERROR: An error occurred during saving experience {}: {}",
                        key,
                        e
                    );
                }
                return Err(e);
            }
            written += 1;
        }
        tx.commit()?;
        Ok(written)
    }

    /// Insert or replace an experience on a blocking worker.
    pub async fn asave(&self, key: &str, record: &MemoryRecord) -> Result<(), anyhow::Error> {
        let db_path = self.db_path.clone();
        let verbose = self.verbose;
        let key = key.to_string();
        let record = record.clone();

        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&db_path, verbose, "saving an experience")?;
            write_record(&conn, &key, &record)
        })
        .await?
    }

    /// Every stored experience in insertion order.
    pub fn load_all(&self) -> Result<Vec<(String, MemoryRecord)>, anyhow::Error> {
        let conn = self.open("loading experiences")?;
        read_all(&conn)
    }

    /// Every stored experience, loaded on a blocking worker.
    pub async fn aload_all(&self) -> Result<Vec<(String, MemoryRecord)>, anyhow::Error> {
        let db_path = self.db_path.clone();
        let verbose = self.verbose;

        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&db_path, verbose, "loading experiences")?;
            read_all(&conn)
        })
        .await?
    }

    /// Delete the experience under `key`. Returns whether a row was removed.
    pub fn delete(&self, key: &str) -> Result<bool, anyhow::Error> {
        let conn = self.open("deleting an experience")?;
        let removed = conn.execute("DELETE FROM experiences WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Delete every stored experience.
    pub fn reset(&self) -> Result<(), anyhow::Error> {
        let conn = self.open("deleting all experiences")?;
        conn.execute("DELETE FROM experiences", [])?;
        Ok(())
    }
}

fn open_connection(path: &Path, verbose: bool, action: &str) -> Result<Connection, anyhow::Error> {
    Connection::open(path).map_err(|e| {
        if verbose {
            log::error!("MEMORY ERROR: An error occurred during {}: {}", action, e);
        }
        e.into()
    })
}

fn write_record(conn: &Connection, key: &str, record: &MemoryRecord) -> Result<(), anyhow::Error> {
    let state_json = serde_json::to_string(&record.state)?;
    conn.execute(
        UPSERT,
        params![
            key,
            state_json,
            record.meaning,
            record.performance,
            record.datetime.to_rfc3339()
        ],
    )?;
    Ok(())
}

fn read_all(conn: &Connection) -> Result<Vec<(String, MemoryRecord)>, anyhow::Error> {
    let mut stmt = conn.prepare(SELECT_ALL)?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let state: String = row.get(1)?;
        let meaning: String = row.get(2)?;
        let performance: f64 = row.get(3)?;
        let datetime: String = row.get(4)?;
        Ok((key, state, meaning, performance, datetime))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (key, state, meaning, performance, datetime) = row?;
        let state: Vec<f64> = serde_json::from_str(&state)?;
        let datetime = DateTime::parse_from_rfc3339(&datetime)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                log::warn!("experience {} has an unreadable datetime ({}); using now", key, e);
                Utc::now()
            });
        results.push((
            key,
            MemoryRecord {
                state,
                meaning,
                performance,
                datetime,
            },
        ));
    }
    Ok(results)
}
