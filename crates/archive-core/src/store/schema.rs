//! Canonical schema and destructive reset.

use super::connection::Store;
use crate::config::StoreConfig;
use crate::error::{ArchiveError, Result};
use tracing::{info, warn};

/// Canonical DDL. `${OWNER}` is replaced by a quoted literal before execution.
const CANONICAL_SCHEMA: &str = include_str!("schema.sql");

/// Quote `value` as an SQL string literal, or `NULL` when absent.
pub fn quote_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{}'", v.replace('\'', "''")),
        None => "NULL".to_string(),
    }
}

/// Render the canonical schema for `owner`.
pub fn render_schema(owner: Option<&str>) -> String {
    CANONICAL_SCHEMA.replace(StoreConfig::OWNER_PLACEHOLDER, &quote_literal(owner))
}

impl Store {
    /// Drop and recreate every table.
    ///
    /// Destructive. Runs in one transaction, so a failing DDL statement leaves
    /// the previous schema in place.
    pub fn reset(&self, owner: Option<&str>) -> Result<()> {
        let mut conn = self.connect()?;
        let ddl = render_schema(owner);

        let tx = conn.transaction()?;
        tx.execute_batch(&ddl).map_err(|e| {
            warn!("Schema creation failed: {}", e);
            ArchiveError::Schema {
                message: format!("Failed to create schema: {}", e),
            }
        })?;
        tx.commit()?;

        info!(
            "Recreated archive schema v{} in {}",
            StoreConfig::SCHEMA_VERSION,
            self.db_path().display()
        );
        Ok(())
    }
}
