//! Property type registry.
//!
//! Maps every metadata property name declared by the `data.json` schema to the
//! value table it is stored in.

mod property_types;

pub use property_types::{PropertyType, PropertyTypeRegistry};
