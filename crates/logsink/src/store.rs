// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

//! Size-bounded SQLite event store.
//!
//! Events are appended to a single `Events` table. Before every insert the
//! store measures the real file footprint; when it crosses 90% of the
//! ceiling, the oldest rows are deleted and the file is compacted so the
//! next size check sees actual disk usage rather than dead pages. If even
//! that does not bring the file under the ceiling, the insert is refused.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::StoreError;
use crate::event::Event;

/// Hard ceiling on the database file size: 15 MiB.
pub const MAX_SIZE_BYTES: u64 = 15 * 1024 * 1024;

/// Number of oldest rows removed per eviction pass.
pub const EVICTION_BATCH: usize = 1000;

/// Eviction kicks in when the file reaches this share of the ceiling.
/// Evicting early avoids evict-one/insert-one thrashing right at the limit.
const EVICTION_THRESHOLD_PERCENT: u64 = 90;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Events(
    Timestamp INTEGER NOT NULL,
    Loglevel TEXT NOT NULL COLLATE NOCASE,
    Source TEXT NOT NULL COLLATE NOCASE,
    Category TEXT COLLATE NOCASE,
    Message TEXT NOT NULL COLLATE NOCASE
);

CREATE INDEX IF NOT EXISTS Category_index ON Events (Category COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS Loglevel_index ON Events (Loglevel COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS Source_index ON Events (Source COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS Timestamp_index ON Events (Timestamp);
";

/// Configuration for the event store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Hard ceiling on the database file size in bytes.
    pub max_size_bytes: u64,
    /// Number of oldest rows removed per eviction pass.
    pub eviction_batch: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("logs.db"),
            max_size_bytes: MAX_SIZE_BYTES,
            eviction_batch: EVICTION_BATCH,
        }
    }
}

impl StoreConfig {
    /// Config with a custom database path and default limits.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    fn eviction_threshold(&self) -> u64 {
        self.max_size_bytes * EVICTION_THRESHOLD_PERCENT / 100
    }
}

/// Durable, size-bounded table of events.
///
/// Exactly one logical writer (the collector loop) is assumed; every call
/// opens a scoped connection, uses it, and drops it, so no connection state
/// outlives the operation.
#[derive(Debug, Clone)]
pub struct EventStore {
    config: StoreConfig,
}

impl EventStore {
    /// Open the store, creating the file and schema when absent.
    ///
    /// Idempotent: safe to call on an existing database. Fails with
    /// [`StoreError::Init`] when the path is unwritable or the existing
    /// file is not a compatible database.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.db_path).map_err(|source| StoreError::Init {
            path: config.db_path.clone(),
            source,
        })?;
        conn.execute_batch(SCHEMA).map_err(|source| StoreError::Init {
            path: config.db_path.clone(),
            source,
        })?;
        Ok(Self { config })
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current on-disk footprint of the database file in bytes.
    pub fn file_size(&self) -> Result<u64, StoreError> {
        Ok(fs::metadata(&self.config.db_path)?.len())
    }

    /// Append one event, evicting the oldest rows first when the file is
    /// close to the ceiling.
    ///
    /// A single insert may drop up to [`EVICTION_BATCH`] unrelated old rows;
    /// eviction always targets the globally oldest rows, never anything
    /// related to the event being inserted. When eviction plus compaction
    /// still leaves the file at or over the ceiling, the insert is aborted
    /// with [`StoreError::CapacityExceeded`] and nothing is persisted.
    pub fn insert(&self, event: &Event) -> Result<(), StoreError> {
        let conn = self.connect()?;

        if self.file_size()? >= self.config.eviction_threshold() {
            self.evict_oldest(&conn)?;

            if self.file_size()? >= self.config.max_size_bytes {
                return Err(StoreError::CapacityExceeded);
            }
        }

        conn.execute(
            "INSERT INTO Events (Timestamp, Loglevel, Source, Category, Message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.timestamp,
                event.level,
                event.source,
                event.category,
                event.message
            ],
        )?;
        Ok(())
    }

    /// Number of stored events.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// All stored timestamps in eviction order (oldest first, insertion
    /// order breaking ties).
    pub fn timestamps(&self) -> Result<Vec<i64>, StoreError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT Timestamp FROM Events ORDER BY Timestamp ASC, rowid ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<i64>, _>>()
            .map_err(StoreError::from)
    }

    /// Most recently inserted event, if any.
    pub fn latest(&self) -> Result<Option<Event>, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT Timestamp, Loglevel, Source, Category, Message
             FROM Events ORDER BY rowid DESC LIMIT 1",
            [],
            |row| {
                Ok(Event {
                    timestamp: row.get(0)?,
                    level: row.get(1)?,
                    source: row.get(2)?,
                    category: row.get(3)?,
                    message: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Scoped connection: open, use, drop. The single-writer assumption
    /// makes pooling unnecessary.
    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.config.db_path)?)
    }

    /// Delete the oldest rows (by timestamp, rowid breaking ties) and
    /// compact the file so freed pages are returned to the filesystem.
    /// Without the VACUUM, deleted rows would keep counting against the
    /// ceiling in the next size check.
    fn evict_oldest(&self, conn: &Connection) -> Result<(), StoreError> {
        let evicted = conn.execute(
            "DELETE FROM Events WHERE rowid IN (
                 SELECT rowid FROM Events ORDER BY Timestamp ASC, rowid ASC LIMIT ?1
             )",
            params![self.config.eviction_batch],
        )?;
        conn.execute_batch("VACUUM")?;
        debug!("store near size limit, evicted {} oldest events", evicted);
        Ok(())
    }
}
