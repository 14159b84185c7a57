//! Store handle handing out per-operation SQLite connections.

use crate::config::StoreConfig;
use crate::error::{ArchiveError, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Row counts of the main tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCounts {
    pub entries: u64,
    pub software: u64,
    pub properties: u64,
}

/// Handle to the relational store.
///
/// Cloning is cheap. Every operation opens its own connection through
/// [`Store::connect`] and drops it when done, so no connection outlives the
/// call that acquired it.
#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: StoreConfig::BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Get the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a configured connection.
    pub fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| ArchiveError::Connection {
                    message: format!("Failed to create directory {}: {}", parent.display(), e),
                    source: None,
                })?;
            }
        }

        let conn = Connection::open(&self.db_path).map_err(|e| ArchiveError::Connection {
            message: format!("Failed to open {}: {}", self.db_path.display(), e),
            source: Some(e),
        })?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| ArchiveError::Connection {
                message: format!("Failed to set busy timeout: {}", e),
                source: Some(e),
            })?;

        Self::configure_connection(&conn)?;
        Ok(conn)
    }

    /// Configure connection with optimal settings.
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            PRAGMA foreign_keys=ON;
            ",
        )
        .map_err(|e| ArchiveError::Connection {
            message: format!("Failed to set pragmas: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    /// Owner recorded at the last reset, if any.
    pub fn owner(&self) -> Result<Option<String>> {
        let conn = self.connect()?;
        let owner = conn
            .query_row(
                "SELECT value FROM archive_meta WHERE key = 'owner'",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(owner.flatten())
    }

    /// Count entries, software references and property definitions.
    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.connect()?;
        let count = |table: &str| -> Result<u64> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n as u64)
        };

        let counts = StoreCounts {
            entries: count("entry")?,
            software: count("software")?,
            properties: count("property")?,
        };
        debug!("Store counts: {:?}", counts);
        Ok(counts)
    }
}
