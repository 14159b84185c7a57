//! SQLite store: connection handling, canonical schema, reset.

mod connection;
mod schema;

pub use connection::{Store, StoreCounts};
pub use schema::{quote_literal, render_schema};

/// True if `err` is a UNIQUE/PRIMARY KEY violation. Other constraint
/// failures (NOT NULL, CHECK, foreign keys) are not.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
