//! Download assembly: single stored files or a zip bundle of a snapshot.

mod assembler;
mod kind;
pub mod paths;
mod sink;

pub use assembler::{ArchiveAssembler, Materialized};
pub use kind::FileKind;
pub use paths::{normalize_identifier, shard_prefix, snapshot_dir};
pub use sink::{ArchiveSink, ZipSink};
