//! Transactional load of one candidate into the store.

use super::metadata::{read_entry_metadata, EntryMetadata, PropertyValue};
use super::scanner::Candidate;
use crate::error::{ArchiveError, Result};
use crate::registry::{PropertyType, PropertyTypeRegistry};
use crate::store::is_unique_violation;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;

/// What happened to a candidate that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Imported,
    /// Already present, possibly inserted by a concurrent worker.
    Skipped,
}

/// Load `candidate` in one immediate transaction.
///
/// On error nothing of the candidate is left in the store.
pub fn load_candidate(
    conn: &mut Connection,
    registry: &PropertyTypeRegistry,
    candidate: &Candidate,
) -> Result<LoadOutcome> {
    let metadata = read_entry_metadata(&candidate.versions_path(), &candidate.data_path())?;

    let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if entry_exists(&tx, &candidate.identifier, &candidate.hash)? {
        return Ok(LoadOutcome::Skipped);
    }

    let Some(entry_id) = claim_entry(&tx, candidate, &metadata)? else {
        return Ok(LoadOutcome::Skipped);
    };

    for software in &metadata.software {
        let software_id = resolve_software(&mut tx, &software.name, software.version.as_deref())?;
        tx.execute(
            "INSERT OR IGNORE INTO entry_software (entry_id, software_id, used) VALUES (?1, ?2, 1)",
            params![entry_id, software_id],
        )?;
    }

    for (name, value) in &metadata.properties {
        let ty = registry.type_of(name)?;
        let typed = PropertyValue::from_json(ty, value).map_err(|message| {
            ArchiveError::malformed(candidate.data_path(), format!("{}: {}", name, message))
        })?;
        let property_id = resolve_property(&mut tx, name, ty)?;
        tx.execute(
            &format!(
                "INSERT INTO {} (entry_id, property_id, value) VALUES (?1, ?2, ?3)",
                ty.value_table()
            ),
            params![entry_id, property_id, typed.to_sql()],
        )?;
    }

    tx.commit()?;
    debug!(
        "Imported {} {} ({} software, {} properties)",
        candidate.identifier,
        candidate.hash,
        metadata.software.len(),
        metadata.properties.len()
    );
    Ok(LoadOutcome::Imported)
}

fn entry_exists(conn: &Connection, identifier: &str, hash: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM entry WHERE identifier = ?1 AND hash = ?2",
            params![identifier, hash],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Insert the entry row. `None` if another writer already holds
/// `(identifier, hash)`.
fn claim_entry(
    conn: &Connection,
    candidate: &Candidate,
    metadata: &EntryMetadata,
) -> Result<Option<i64>> {
    match insert_entry(conn, candidate, metadata) {
        Ok(id) => Ok(Some(id)),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn insert_entry(
    conn: &Connection,
    candidate: &Candidate,
    metadata: &EntryMetadata,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO entry (identifier, hash, date, coordinates_revision, reflections_revision,
                            coordinates_edited, reflections_edited)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            candidate.identifier,
            candidate.hash,
            metadata.date.format("%Y-%m-%d").to_string(),
            metadata.coordinates_revision,
            metadata.reflections_revision,
            metadata.coordinates_edited,
            metadata.reflections_edited,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find-else-insert. The insert runs in a savepoint so that losing a race
/// against another writer only rolls back the savepoint.
fn resolve_or_create<F, I>(tx: &mut Transaction<'_>, find: F, insert: I) -> Result<i64>
where
    F: Fn(&Connection) -> rusqlite::Result<Option<i64>>,
    I: FnOnce(&Connection) -> rusqlite::Result<usize>,
{
    if let Some(id) = find(&**tx)? {
        return Ok(id);
    }

    {
        let sp = tx.savepoint()?;
        match insert(&*sp) {
            Ok(_) => {
                let id = sp.last_insert_rowid();
                sp.commit()?;
                return Ok(id);
            }
            Err(e) if is_unique_violation(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    find(&**tx)?.ok_or_else(|| ArchiveError::Database {
        message: "Row vanished after uniqueness conflict".to_string(),
        source: None,
    })
}

fn resolve_software(tx: &mut Transaction<'_>, name: &str, version: Option<&str>) -> Result<i64> {
    resolve_or_create(
        tx,
        |conn| {
            conn.query_row(
                "SELECT id FROM software WHERE name = ?1 AND version IS ?2",
                params![name, version],
                |row| row.get(0),
            )
            .optional()
        },
        |conn| {
            conn.execute(
                "INSERT INTO software (name, version) VALUES (?1, ?2)",
                params![name, version],
            )
        },
    )
}

/// Find or create the property definition. A stored type that disagrees
/// with the registry is a schema error.
fn resolve_property(tx: &mut Transaction<'_>, name: &str, ty: PropertyType) -> Result<i64> {
    let id = resolve_or_create(
        tx,
        |conn| {
            conn.query_row(
                "SELECT id FROM property WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
        },
        |conn| {
            conn.execute(
                "INSERT INTO property (name, type) VALUES (?1, ?2)",
                params![name, ty.as_str()],
            )
        },
    )?;

    let stored: String = tx.query_row(
        "SELECT type FROM property WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if stored != ty.as_str() {
        return Err(ArchiveError::Schema {
            message: format!(
                "Property {} is stored as {} but declared as {}",
                name, stored, ty
            ),
        });
    }
    Ok(id)
}
