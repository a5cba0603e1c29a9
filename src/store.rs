//! History log storage.
//!
//! Status changes are appended to a SQLite table and pruned to the newest
//! `limit` entries. The log can be exported to and merged from a JSON array
//! of [`HistoryEntry`].

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{GameMode, HistoryEntry, RankStatus};

/// Entries kept when no limit is configured
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history (
    timestamp_ms  INTEGER NOT NULL,
    beatmapset_id INTEGER NOT NULL,
    title         TEXT NOT NULL,
    creator       TEXT NOT NULL,
    old_status    TEXT NOT NULL,
    new_status    TEXT NOT NULL,
    ranked_date   TEXT,
    mode          TEXT NOT NULL,
    PRIMARY KEY (timestamp_ms, beatmapset_id)
);
";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("History file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid history file: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct HistoryStore {
    conn: Connection,
    limit: usize,
}

impl HistoryStore {
    pub fn open(path: &Path, limit: usize) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened history database");
        Self::with_connection(conn, limit)
    }

    pub fn open_in_memory(limit: usize) -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?, limit)
    }

    fn with_connection(conn: Connection, limit: usize) -> Result<Self, HistoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            limit: limit.max(1),
        })
    }

    /// Change the retention limit and prune immediately
    pub fn set_limit(&mut self, limit: usize) -> Result<(), HistoryError> {
        self.limit = limit.max(1);
        self.prune()?;
        Ok(())
    }

    /// Append one entry. Returns `false` if an entry with the same timestamp
    /// and beatmapset already existed.
    pub fn append(&mut self, entry: &HistoryEntry) -> Result<bool, HistoryError> {
        let inserted = self.insert(entry)?;
        self.prune()?;
        Ok(inserted)
    }

    fn insert(&self, entry: &HistoryEntry) -> Result<bool, HistoryError> {
        let (timestamp_ms, beatmapset_id) = entry.key();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO history
                (timestamp_ms, beatmapset_id, title, creator, old_status, new_status, ranked_date, mode)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                timestamp_ms,
                beatmapset_id as i64,
                entry.title,
                entry.creator,
                entry.old_status.as_str(),
                entry.new_status.as_str(),
                entry.ranked_date,
                entry.mode.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Drop everything but the newest `limit` entries
    fn prune(&self) -> Result<usize, HistoryError> {
        let removed = self.conn.execute(
            "DELETE FROM history WHERE rowid NOT IN (
                SELECT rowid FROM history ORDER BY timestamp_ms DESC, rowid DESC LIMIT ?1
             )",
            params![self.limit as i64],
        )?;
        if removed > 0 {
            debug!(removed, limit = self.limit, "Pruned history");
        }
        Ok(removed)
    }

    /// All entries, newest first
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp_ms, beatmapset_id, title, creator, old_status, new_status, ranked_date, mode
             FROM history ORDER BY timestamp_ms DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            let timestamp_ms: i64 = row.get(0)?;
            let beatmapset_id: i64 = row.get(1)?;
            let old_status: String = row.get(4)?;
            let new_status: String = row.get(5)?;
            let mode: String = row.get(7)?;

            Ok(HistoryEntry {
                timestamp: DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
                    .unwrap_or_default(),
                beatmapset_id: beatmapset_id as u64,
                title: row.get(2)?,
                creator: row.get(3)?,
                old_status: RankStatus::from_api(&old_status),
                new_status: RankStatus::from_api(&new_status),
                ranked_date: row.get(6)?,
                mode: mode.parse().unwrap_or(GameMode::Osu),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Remove one entry. Returns `false` if it was not in the log.
    pub fn delete(&mut self, entry: &HistoryEntry) -> Result<bool, HistoryError> {
        let (timestamp_ms, beatmapset_id) = entry.key();
        let removed = self.conn.execute(
            "DELETE FROM history WHERE timestamp_ms = ?1 AND beatmapset_id = ?2",
            params![timestamp_ms, beatmapset_id as i64],
        )?;
        if removed > 0 {
            info!(id = beatmapset_id, "Deleted history entry");
        }
        Ok(removed > 0)
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize, HistoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove every entry and return how many were removed
    pub fn clear(&mut self) -> Result<usize, HistoryError> {
        let removed = self.conn.execute("DELETE FROM history", [])?;
        info!(removed, "Cleared history");
        Ok(removed)
    }

    /// Write the log as a JSON array, newest first
    pub fn export_json(&self, path: &Path) -> Result<usize, HistoryError> {
        let entries = self.entries()?;
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(path, json)?;
        info!(path = %path.display(), count = entries.len(), "Exported history");
        Ok(entries.len())
    }

    /// Merge a JSON array of entries, skipping ones already present.
    /// Returns the number of new entries.
    pub fn import_json(&mut self, path: &Path) -> Result<usize, HistoryError> {
        let content = fs::read_to_string(path)?;
        let imported: Vec<HistoryEntry> = serde_json::from_str(&content)?;

        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        for entry in &imported {
            if self.insert(entry)? {
                added += 1;
            }
        }
        tx.commit()?;
        self.prune()?;

        info!(path = %path.display(), added, total = imported.len(), "Imported history");
        Ok(added)
    }
}
