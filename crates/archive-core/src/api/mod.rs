//! API implementation submodules.
//!
//! Each submodule contains `impl ArchiveApi` blocks that extend the public API
//! with one area of functionality. The struct definition remains in `lib.rs`.

mod builder;
mod files;
mod import;
mod query;
mod state;

pub use builder::ArchiveApiBuilder;
pub(crate) use state::{run_blocking, ApiState};
