//! Import pipeline: tree scan, metadata parsing and transactional load.

mod loader;
mod metadata;
mod pipeline;
mod scanner;

pub use loader::{load_candidate, LoadOutcome};
pub use metadata::{read_entry_metadata, EntryMetadata, PropertyValue, SoftwareUse};
pub use pipeline::{Importer, RescanReport};
pub use scanner::{scan, Candidate};
