//! Reset and rescan entry points.

use super::loader::{load_candidate, LoadOutcome};
use super::scanner::{scan, Candidate};
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::progress::Progress;
use crate::registry::PropertyTypeRegistry;
use crate::store::Store;
use rayon::prelude::*;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome tallies of one rescan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescanReport {
    pub candidates: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Loads the archive tree into the store.
#[derive(Debug, Clone)]
pub struct Importer {
    store: Store,
    registry: Arc<PropertyTypeRegistry>,
    root: PathBuf,
    owner: Option<String>,
    workers: usize,
    reset_before_rescan: bool,
}

impl Importer {
    pub fn new(store: Store, registry: Arc<PropertyTypeRegistry>, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            registry,
            root: root.into(),
            owner: None,
            workers: 1,
            reset_before_rescan: false,
        }
    }

    pub fn from_config(config: &ArchiveConfig, store: Store, registry: Arc<PropertyTypeRegistry>) -> Self {
        Self::new(store, registry, &config.archive_root)
            .with_owner(config.owner.clone())
            .with_workers(config.workers)
            .with_reset_before_rescan(config.reset_before_rescan)
    }

    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Number of parallel workers; 0 is treated as 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_reset_before_rescan(mut self, reset: bool) -> Self {
        self.reset_before_rescan = reset;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop and recreate the schema.
    pub fn reset(&self) -> Result<()> {
        self.store.reset(self.owner.as_deref())
    }

    /// Import every snapshot under the archive root.
    ///
    /// Failures are isolated per candidate: they are logged and counted in
    /// the report, and never abort the scan.
    pub fn rescan(&self) -> Result<RescanReport> {
        if self.reset_before_rescan {
            self.reset()?;
        }

        // Fail fast on an unreachable store instead of failing every candidate.
        drop(self.store.connect()?);

        let candidates = scan(&self.root)?;
        let mut report = RescanReport {
            candidates: candidates.len(),
            ..RescanReport::default()
        };

        if !candidates.is_empty() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers.min(candidates.len()))
                .thread_name(|i| format!("import-{}", i))
                .build()
                .map_err(|e| ArchiveError::Other(format!("Failed to start import workers: {}", e)))?;

            let progress = Progress::new("Importing entries", candidates.len() as u64);
            let outcomes: Vec<Option<LoadOutcome>> = pool.install(|| {
                candidates
                    .par_iter()
                    .map_init(
                        || self.store.connect(),
                        |conn, candidate| self.import_one(conn, candidate, &progress),
                    )
                    .collect()
            });

            for outcome in outcomes {
                match outcome {
                    Some(LoadOutcome::Imported) => report.imported += 1,
                    Some(LoadOutcome::Skipped) => report.skipped += 1,
                    None => report.failed += 1,
                }
            }
        }

        info!(
            "Rescan of {}: {} candidates, {} imported, {} skipped, {} failed",
            self.root.display(),
            report.candidates,
            report.imported,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Load one candidate on a worker's connection. `None` means it failed.
    fn import_one(
        &self,
        conn: &mut Result<Connection>,
        candidate: &Candidate,
        progress: &Progress,
    ) -> Option<LoadOutcome> {
        progress.message(&candidate.identifier);
        let outcome = match conn {
            Ok(conn) => load_candidate(conn, &self.registry, candidate),
            Err(e) => Err(ArchiveError::Database {
                message: format!("Import worker could not connect: {}", e),
                source: None,
            }),
        };
        progress.consumed(1);

        match outcome {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    "Failed to import {} {}: {}",
                    candidate.identifier, candidate.hash, e
                );
                None
            }
        }
    }
}
