//! Builder for configuring ArchiveApi initialization.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::api::state::ApiState;
use crate::archive::ArchiveAssembler;
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::import::Importer;
use crate::query::QueryEngine;
use crate::registry::PropertyTypeRegistry;
use crate::store::Store;
use crate::ArchiveApi;

enum SchemaSource {
    Path(PathBuf),
    Value(Value),
}

/// Builder for configuring ArchiveApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use pdb_archive::ArchiveApi;
///
/// let api = ArchiveApi::builder("/srv/pdb-redo", "/var/lib/pdb-redo/archive.db")
///     .schema_path("/srv/pdb-redo/schema.json")
///     .owner(Some("pdb_redo".into()))
///     .workers(4)
///     .build()?;
/// ```
pub struct ArchiveApiBuilder {
    config: ArchiveConfig,
    schema: Option<SchemaSource>,
}

impl ArchiveApiBuilder {
    /// Create a new builder for an archive root and database file.
    pub fn new(archive_root: impl Into<PathBuf>, database_path: impl Into<PathBuf>) -> Self {
        Self::from_config(ArchiveConfig::new(archive_root, database_path))
    }

    /// Start from a fully resolved configuration.
    pub fn from_config(config: ArchiveConfig) -> Self {
        Self {
            config,
            schema: None,
        }
    }

    /// Read the property schema from a JSON file.
    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema = Some(SchemaSource::Path(path.into()));
        self
    }

    /// Use an already parsed property schema.
    pub fn schema_value(mut self, schema: Value) -> Self {
        self.schema = Some(SchemaSource::Value(schema));
        self
    }

    /// JSON pointer to the property definitions inside the schema.
    ///
    /// Default: `/properties/properties/properties`
    pub fn schema_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.config.schema_pointer = pointer.into();
        self
    }

    /// Owner recorded by `reset`.
    pub fn owner(mut self, owner: Option<String>) -> Self {
        self.config.owner = owner;
        self
    }

    /// Parallel import workers.
    ///
    /// Default: `1`
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Rebuild the schema at the start of every rescan.
    ///
    /// Default: `false`
    pub fn reset_before_rescan(mut self, enable: bool) -> Self {
        self.config.reset_before_rescan = enable;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout = timeout;
        self
    }

    /// Build the ArchiveApi instance.
    pub fn build(self) -> Result<ArchiveApi> {
        if self.config.workers == 0 {
            return Err(ArchiveError::Config {
                message: "workers must be at least 1".to_string(),
            });
        }

        let pointer = &self.config.schema_pointer;
        let registry = match &self.schema {
            Some(SchemaSource::Path(path)) => PropertyTypeRegistry::load_file(path, pointer)?,
            Some(SchemaSource::Value(value)) => PropertyTypeRegistry::load(value, pointer)?,
            None => {
                return Err(ArchiveError::Config {
                    message: "No property schema configured".to_string(),
                })
            }
        };
        let registry = Arc::new(registry);

        let store = Store::new(&self.config.database_path).with_busy_timeout(self.config.busy_timeout);
        let importer = Importer::from_config(&self.config, store.clone(), registry.clone());
        let engine = QueryEngine::new(store.clone(), registry.clone());
        let assembler = ArchiveAssembler::new(&self.config.archive_root);

        info!(
            "Archive API ready: root {}, store {}, {} known properties",
            self.config.archive_root.display(),
            self.config.database_path.display(),
            registry.len()
        );

        Ok(ArchiveApi {
            config: self.config,
            state: Arc::new(ApiState {
                store,
                registry,
                importer,
                engine,
                assembler,
            }),
        })
    }
}
