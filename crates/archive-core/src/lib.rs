//! PDB-REDO archive data service - headless core for result-set import,
//! filtered queries and download assembly.
//!
//! The crate loads a sharded tree of versioned result snapshots into a SQLite
//! store, answers typed filter queries against it, and packages snapshot
//! files for download. HTTP routing and rendering live elsewhere; they call
//! into [`ArchiveApi`] or the individual components.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdb_archive::{ArchiveApi, Filter, Operator, Query};
//!
//! #[tokio::main]
//! async fn main() -> pdb_archive::Result<()> {
//!     let api = ArchiveApi::builder("/srv/pdb-redo", "/var/lib/pdb-redo/archive.db")
//!         .schema_path("/srv/pdb-redo/schema.json")
//!         .build()?;
//!
//!     let report = api.rescan().await?;
//!     println!("Imported {} of {} snapshots", report.imported, report.candidates);
//!
//!     let query = Query::new()
//!         .latest_only()
//!         .with_filter(Filter::property("RFREE", Operator::Lt, "0.25"));
//!     println!("{} matches", api.query_count(query).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod import;
pub mod progress;
pub mod query;
pub mod registry;
pub mod store;

mod api;

// Re-export commonly used types
pub use archive::{ArchiveAssembler, ArchiveSink, FileKind, Materialized, ZipSink};
pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use import::{Importer, RescanReport};
pub use progress::Progress;
pub use query::{
    CompiledQuery, EntrySummary, Filter, Operator, PropertySummary, Query, QueryEngine,
    SoftwareSummary, SubjectType,
};
pub use registry::{PropertyType, PropertyTypeRegistry};
pub use store::{Store, StoreCounts};

// Re-export builder from api module
pub use api::ArchiveApiBuilder;

use std::sync::Arc;

use api::ApiState;

/// Main entry point bundling the store, registry and components.
///
/// Cloning is cheap and clones share the same components. Every async method
/// runs its store or file work on the blocking thread pool.
#[derive(Clone)]
pub struct ArchiveApi {
    config: ArchiveConfig,
    state: Arc<ApiState>,
}

impl ArchiveApi {
    /// Create a builder for ArchiveApi.
    pub fn builder(
        archive_root: impl Into<std::path::PathBuf>,
        database_path: impl Into<std::path::PathBuf>,
    ) -> ArchiveApiBuilder {
        ArchiveApiBuilder::new(archive_root, database_path)
    }

    /// Resolved configuration.
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn registry(&self) -> &PropertyTypeRegistry {
        &self.state.registry
    }

    /// Synchronous query engine, for callers outside an async runtime.
    pub fn engine(&self) -> &QueryEngine {
        &self.state.engine
    }

    /// Synchronous importer, for callers outside an async runtime.
    pub fn importer(&self) -> &Importer {
        &self.state.importer
    }

    pub fn assembler(&self) -> &ArchiveAssembler {
        &self.state.assembler
    }
}

impl std::fmt::Debug for ArchiveApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
