//! Query execution and catalog lookups against the store.

use super::compiler::{compile_all, compile_count, compile_page, page_offset, CompiledQuery};
use super::types::Query;
use crate::error::{ArchiveError, Result};
use crate::registry::{PropertyType, PropertyTypeRegistry};
use crate::store::Store;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One matching snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: String,
    pub hash: String,
    pub date: NaiveDate,
}

/// A program with every version seen in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareSummary {
    pub name: String,
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

/// Executes queries. Holds no connection between calls.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Store,
    registry: Arc<PropertyTypeRegistry>,
}

impl QueryEngine {
    pub fn new(store: Store, registry: Arc<PropertyTypeRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &PropertyTypeRegistry {
        &self.registry
    }

    /// One page of matches. A zero page size returns nothing without
    /// touching the store.
    pub fn compile(&self, query: &Query, page: i64, page_size: i64) -> Result<Vec<EntrySummary>> {
        page_offset(page, page_size)?;
        if page_size == 0 {
            return Ok(Vec::new());
        }
        let compiled = compile_page(query, &self.registry, page, page_size)?;
        self.fetch_entries(&compiled)
    }

    /// Number of matches, ignoring pagination.
    pub fn compile_count(&self, query: &Query) -> Result<u64> {
        let compiled = compile_count(query, &self.registry)?;
        debug!("Count query: {}", compiled.sql);

        let conn = self.store.connect()?;
        let count: i64 = conn.query_row(&compiled.sql, params_from_iter(compiled.params.iter()), |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    /// Every match, unpaginated.
    pub fn compile_all(&self, query: &Query) -> Result<Vec<EntrySummary>> {
        let compiled = compile_all(query, &self.registry)?;
        self.fetch_entries(&compiled)
    }

    fn fetch_entries(&self, compiled: &CompiledQuery) -> Result<Vec<EntrySummary>> {
        debug!("Entry query: {}", compiled.sql);

        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&compiled.sql)?;
        let rows = stmt.query_map(params_from_iter(compiled.params.iter()), row_to_summary)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// All programs, each with its sorted versions. Unversioned references
    /// contribute the name only.
    pub fn list_software(&self) -> Result<Vec<SoftwareSummary>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare("SELECT name, version FROM software ORDER BY name, version")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut software: Vec<SoftwareSummary> = Vec::new();
        for row in rows {
            let (name, version) = row?;
            if software.last().map(|s| s.name != name).unwrap_or(true) {
                software.push(SoftwareSummary {
                    name,
                    versions: Vec::new(),
                });
            }
            if let (Some(version), Some(last)) = (version, software.last_mut()) {
                last.versions.push(version);
            }
        }
        Ok(software)
    }

    /// Property definitions created by imports so far.
    pub fn list_properties(&self) -> Result<Vec<PropertySummary>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare("SELECT name, type FROM property ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut properties = Vec::new();
        for row in rows {
            let (name, tag) = row?;
            let property_type =
                PropertyType::from_schema_tag(&tag).ok_or_else(|| ArchiveError::Database {
                    message: format!("Property {} has unknown type {:?}", name, tag),
                    source: None,
                })?;
            properties.push(PropertySummary {
                name,
                property_type,
            });
        }
        Ok(properties)
    }

    /// Declared type of a property.
    pub fn property_type(&self, name: &str) -> Result<PropertyType> {
        self.registry.type_of(name)
    }

    /// Identifier of the snapshot with `hash`.
    pub fn identifier_for_hash(&self, hash: &str) -> Result<String> {
        let conn = self.store.connect()?;
        conn.query_row(
            "SELECT identifier FROM entry WHERE hash = ?1 ORDER BY identifier LIMIT 1",
            params![hash],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| ArchiveError::EntryNotFound {
            hash: hash.to_string(),
        })
    }
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<EntrySummary> {
    let date: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(EntrySummary {
        id: row.get(0)?,
        hash: row.get(1)?,
        date,
    })
}
