//! Schema reset and archive rescans.

use crate::api::run_blocking;
use crate::error::Result;
use crate::import::RescanReport;
use crate::store::StoreCounts;
use crate::ArchiveApi;

impl ArchiveApi {
    /// Drop and recreate the store schema. Destroys all imported data.
    pub async fn reset(&self) -> Result<()> {
        let state = self.state.clone();
        run_blocking("reset", move || state.importer.reset()).await
    }

    /// Import every snapshot under the archive root.
    pub async fn rescan(&self) -> Result<RescanReport> {
        let state = self.state.clone();
        run_blocking("rescan", move || state.importer.rescan()).await
    }

    /// Row counts of entries, software references and property definitions.
    pub async fn counts(&self) -> Result<StoreCounts> {
        let state = self.state.clone();
        run_blocking("counts", move || state.store.counts()).await
    }

    /// Owner recorded at the last reset.
    pub async fn owner(&self) -> Result<Option<String>> {
        let state = self.state.clone();
        run_blocking("owner", move || state.store.owner()).await
    }
}
