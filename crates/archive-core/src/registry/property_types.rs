//! Schema-driven property type lookup.

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Storage type of a metadata property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
        }
    }

    /// Map a JSON Schema primitive tag. `integer` is stored as a number.
    pub fn from_schema_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(PropertyType::String),
            "number" | "integer" => Some(PropertyType::Number),
            "boolean" => Some(PropertyType::Boolean),
            _ => None,
        }
    }

    /// Name of the table holding values of this type.
    pub fn value_table(&self) -> &'static str {
        match self {
            PropertyType::String => "property_value_string",
            PropertyType::Number => "property_value_number",
            PropertyType::Boolean => "property_value_boolean",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only mapping from property name to [`PropertyType`].
#[derive(Debug, Clone, Default)]
pub struct PropertyTypeRegistry {
    types: BTreeMap<String, PropertyType>,
}

impl PropertyTypeRegistry {
    /// Build the registry from a schema document.
    ///
    /// `pointer` is a JSON pointer to the object holding the property
    /// definitions. Each definition's `type` is a single tag or a list of
    /// tags; the first recognized primitive wins.
    pub fn load(schema: &Value, pointer: &str) -> Result<Self> {
        let definitions = schema
            .pointer(pointer)
            .and_then(Value::as_object)
            .ok_or_else(|| ArchiveError::Schema {
                message: format!("No property definitions found at {}", pointer),
            })?;

        let mut types = BTreeMap::new();
        for (name, definition) in definitions {
            let property_type = Self::declared_type(definition).ok_or_else(|| {
                ArchiveError::Schema {
                    message: format!("Property {} declares no string, number or boolean type", name),
                }
            })?;
            types.insert(name.clone(), property_type);
        }

        debug!("Loaded {} property types", types.len());
        Ok(Self { types })
    }

    /// Read and load a schema file.
    pub fn load_file(path: impl AsRef<Path>, pointer: &str) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ArchiveError::io_with_path(e, path))?;
        let schema: Value = serde_json::from_str(&text).map_err(|e| ArchiveError::Schema {
            message: format!("Failed to parse schema {}: {}", path.display(), e),
        })?;
        Self::load(&schema, pointer)
    }

    fn declared_type(definition: &Value) -> Option<PropertyType> {
        match definition.get("type")? {
            Value::String(tag) => PropertyType::from_schema_tag(tag),
            Value::Array(tags) => tags
                .iter()
                .filter_map(Value::as_str)
                .find_map(PropertyType::from_schema_tag),
            _ => None,
        }
    }

    /// Type of the property `name`.
    pub fn type_of(&self, name: &str) -> Result<PropertyType> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| ArchiveError::UnknownProperty {
                name: name.to_string(),
            })
    }

    /// All properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PropertyType)> {
        self.types.iter().map(|(name, t)| (name.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
