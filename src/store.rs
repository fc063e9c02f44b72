use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::defaults::DEFAULT_TEXTS;

/// One row of the append-only history table.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub key: String,
    pub value: String,
    pub changed_at: DateTime<Utc>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS site_text (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS site_text_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,
    changed_at TEXT NOT NULL
);
";

const UPSERT: &str = "
INSERT INTO site_text (key, value, updated_at) VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

const APPEND_HISTORY: &str = "
INSERT INTO site_text_history (key, value, changed_at) VALUES (?1, ?2, ?3)
";

/// SQLite-backed store for the editable site text.
///
/// One current-value row per key plus an append-only history of every write.
/// All access goes through a single connection behind a mutex, so concurrent
/// writers serialize and the upsert decides last-write-wins.
#[derive(Clone)]
pub struct TextStore {
    conn: Arc<Mutex<Connection>>,
}

impl TextStore {
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.seed_defaults()?;
        Ok(store)
    }

    /// Insert the built-in defaults for any key not yet present.
    ///
    /// After this runs once, every known key always has a current value;
    /// nothing ever deletes a row.
    fn seed_defaults(&self) -> Result<(), rusqlite::Error> {
        let now = Utc::now();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for (key, value) in DEFAULT_TEXTS {
            tx.execute(
                "INSERT INTO site_text (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO NOTHING",
                params![key, value, now],
            )?;
        }

        tx.commit()
    }

    /// Current value of every known key.
    pub fn get_all(&self) -> Result<BTreeMap<String, String>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM site_text")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            out.insert(key, value);
        }
        Ok(out)
    }

    /// Upsert the current value for `key` and append a history row, in one
    /// transaction.
    pub fn set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        let now = Utc::now();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(UPSERT, params![key, value, now])?;
        tx.execute(APPEND_HISTORY, params![key, value, now])?;

        tx.commit()
    }

    /// Overwrite every known key back to its built-in default in one
    /// transaction. Keys already holding their default are left untouched
    /// (no history row for a write that changes nothing).
    pub fn reset_all(&self) -> Result<(), rusqlite::Error> {
        let now = Utc::now();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for (key, default) in DEFAULT_TEXTS {
            let current: Option<String> = tx
                .query_row(
                    "SELECT value FROM site_text WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;

            if current.as_deref() == Some(*default) {
                continue;
            }

            tx.execute(UPSERT, params![key, default, now])?;
            tx.execute(APPEND_HISTORY, params![key, default, now])?;
        }

        tx.commit()
    }

    /// Up to `limit` most recent history rows across all keys, newest first.
    ///
    /// `id DESC` is insertion order, which is timestamp order under the
    /// single serialized writer.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT key, value, changed_at FROM site_text_history
             ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryRecord {
                key: row.get(0)?,
                value: row.get(1)?,
                changed_at: row.get(2)?,
            })
        })?;

        rows.collect()
    }
}
