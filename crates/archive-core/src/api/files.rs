//! File downloads.

use crate::api::run_blocking;
use crate::archive::{FileKind, Materialized};
use crate::error::Result;
use crate::ArchiveApi;
use tracing::debug;

impl ArchiveApi {
    /// Resolve or assemble the download for one snapshot.
    ///
    /// Bundles are assembled in memory before this returns.
    pub async fn materialize(&self, identifier: &str, hash: &str, kind: FileKind) -> Result<Materialized> {
        debug!("Materializing {} for {} {}", kind, identifier, hash);
        let state = self.state.clone();
        let identifier = identifier.to_string();
        let hash = hash.to_string();
        run_blocking("materialize", move || {
            state.assembler.materialize(&identifier, &hash, kind)
        })
        .await
    }
}
