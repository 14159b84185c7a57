//! Centralized configuration for the archive data service.
//!
//! Constant groups describe the on-disk layout and tuning knobs; [`ArchiveConfig`]
//! carries the resolved values an operator supplies.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// On-disk layout of the result archive.
pub struct PathsConfig;

impl PathsConfig {
    pub const ATTIC_DIR_NAME: &'static str = "attic";
    pub const VERSIONS_FILE_NAME: &'static str = "versions.json";
    pub const DATA_FILE_NAME: &'static str = "data.json";
    pub const COORDINATES_FILE_NAME: &'static str = "final.cif";
    pub const REFLECTIONS_FILE_NAME: &'static str = "final.mtz";
    pub const GZIP_EXTENSION: &'static str = "gz";
    pub const SHARD_PREFIX_LEN: usize = 2;
}

/// Relational store settings.
pub struct StoreConfig;

impl StoreConfig {
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const SCHEMA_VERSION: u32 = 1;
    pub const OWNER_PLACEHOLDER: &'static str = "${OWNER}";
}

/// Progress reporter timing.
pub struct ProgressConfig;

impl ProgressConfig {
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
    pub const GRACE_PERIOD: Duration = Duration::from_secs(5);
    pub const BAR_WIDTH: usize = 50;
    pub const MESSAGE_WIDTH: usize = 20;
}

/// Query defaults.
pub struct QueryConfig;

impl QueryConfig {
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
    /// Location of the property definitions inside the `data.json` schema.
    pub const DEFAULT_SCHEMA_POINTER: &'static str = "/properties/properties/properties";
}

/// Bundle assembly settings.
pub struct BundleConfig;

impl BundleConfig {
    pub const EXTENSION: &'static str = "zip";
    pub const ENTRY_MODE: u32 = 0o644;
    pub const CHUNK_SIZE: usize = 64 * 1024;
}

/// Resolved configuration for one archive service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveConfig {
    /// Root of the sharded result tree.
    pub archive_root: PathBuf,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Database owner recorded when the schema is (re)created.
    #[serde(default)]
    pub owner: Option<String>,
    /// JSON pointer to the property definitions in the schema document.
    #[serde(default = "default_schema_pointer")]
    pub schema_pointer: String,
    /// Number of parallel import workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Rebuild the schema before every rescan.
    #[serde(default)]
    pub reset_before_rescan: bool,
    /// How long a store call waits on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout: Duration,
}

fn default_schema_pointer() -> String {
    QueryConfig::DEFAULT_SCHEMA_POINTER.to_string()
}

fn default_workers() -> usize {
    1
}

fn default_busy_timeout() -> Duration {
    StoreConfig::BUSY_TIMEOUT
}

impl ArchiveConfig {
    /// Configuration with defaults for everything but the two paths.
    pub fn new(archive_root: impl Into<PathBuf>, database_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
            database_path: database_path.into(),
            owner: None,
            schema_pointer: default_schema_pointer(),
            workers: default_workers(),
            reset_before_rescan: false,
            busy_timeout: default_busy_timeout(),
        }
    }
}
