//! Guild-count history, backed by SQLite. One insert per reported count,
//! one latest-row lookup; nothing else reads the table.

use crate::utils::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountEntry {
    pub guild_count: i64,
    pub timestamp: i64,
}

pub struct CountStore {
    db: Mutex<Connection>,
}

impl CountStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        // WAL mode for concurrent reads
        let _ = db.pragma_update(None, "journal_mode", "WAL");

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS guildcount (
                guild_count INTEGER NOT NULL,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_guildcount_timestamp
                ON guildcount (timestamp DESC);",
        )?;

        Ok(Self { db: Mutex::new(db) })
    }

    pub fn record(&self, guild_count: i64, timestamp: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO guildcount (guild_count, timestamp) VALUES (?1, ?2)",
            params![guild_count, timestamp],
        )?;
        Ok(())
    }

    pub fn latest(&self) -> Result<Option<CountEntry>> {
        let db = self.db.lock().unwrap();
        let entry = db
            .query_row(
                "SELECT guild_count, timestamp FROM guildcount
                 ORDER BY timestamp DESC LIMIT 1",
                [],
                |row| {
                    Ok(CountEntry {
                        guild_count: row.get(0)?,
                        timestamp: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }
}
