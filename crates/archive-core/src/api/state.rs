//! Shared components behind an [`ArchiveApi`](crate::ArchiveApi).

use crate::archive::ArchiveAssembler;
use crate::error::{ArchiveError, Result};
use crate::import::Importer;
use crate::query::QueryEngine;
use crate::registry::PropertyTypeRegistry;
use crate::store::Store;
use std::sync::Arc;

/// Components built once by the builder and shared by every call.
pub(crate) struct ApiState {
    pub(crate) store: Store,
    pub(crate) registry: Arc<PropertyTypeRegistry>,
    pub(crate) importer: Importer,
    pub(crate) engine: QueryEngine,
    pub(crate) assembler: ArchiveAssembler,
}

/// Run blocking store or file work off the async executor.
pub(crate) async fn run_blocking<T, F>(task: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ArchiveError::Other(format!("{} task failed: {}", task, e)))?
}
