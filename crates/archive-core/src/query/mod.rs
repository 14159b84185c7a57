//! Filter model, SQL compilation and query execution.

mod compiler;
mod engine;
mod types;

pub use compiler::{compile_all, compile_count, compile_page, page_offset, CompiledQuery};
pub use engine::{EntrySummary, PropertySummary, QueryEngine, SoftwareSummary};
pub use types::{Filter, Operator, Query, SubjectType};
