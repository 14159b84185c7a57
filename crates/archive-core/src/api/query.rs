//! Query and catalog methods.

use crate::api::run_blocking;
use crate::error::Result;
use crate::query::{EntrySummary, PropertySummary, Query, SoftwareSummary};
use crate::registry::PropertyType;
use crate::ArchiveApi;

impl ArchiveApi {
    /// One page of matching entries.
    pub async fn query_page(&self, query: Query, page: i64, page_size: i64) -> Result<Vec<EntrySummary>> {
        let state = self.state.clone();
        run_blocking("query", move || state.engine.compile(&query, page, page_size)).await
    }

    /// Number of matching entries.
    pub async fn query_count(&self, query: Query) -> Result<u64> {
        let state = self.state.clone();
        run_blocking("count", move || state.engine.compile_count(&query)).await
    }

    /// All matching entries, unpaginated.
    pub async fn query_all(&self, query: Query) -> Result<Vec<EntrySummary>> {
        let state = self.state.clone();
        run_blocking("query", move || state.engine.compile_all(&query)).await
    }

    pub async fn list_software(&self) -> Result<Vec<SoftwareSummary>> {
        let state = self.state.clone();
        run_blocking("software", move || state.engine.list_software()).await
    }

    pub async fn list_properties(&self) -> Result<Vec<PropertySummary>> {
        let state = self.state.clone();
        run_blocking("properties", move || state.engine.list_properties()).await
    }

    /// Declared type of a property. Needs no store access.
    pub fn property_type(&self, name: &str) -> Result<PropertyType> {
        self.state.engine.property_type(name)
    }

    /// Identifier of the snapshot with `hash`.
    pub async fn identifier_for_hash(&self, hash: &str) -> Result<String> {
        let state = self.state.clone();
        let hash = hash.to_string();
        run_blocking("lookup", move || state.engine.identifier_for_hash(&hash)).await
    }
}
