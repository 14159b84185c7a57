//! Parsing of the per-snapshot metadata documents.
//!
//! `versions.json` carries revision markers, edit flags and the software that
//! produced the snapshot. `data.json` carries the typed result properties.

use crate::error::{ArchiveError, Result};
use crate::registry::PropertyType;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything the loader needs from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMetadata {
    pub date: NaiveDate,
    pub coordinates_revision: Option<String>,
    pub reflections_revision: Option<String>,
    pub coordinates_edited: bool,
    pub reflections_edited: bool,
    /// Software with `used == true`, in name order.
    pub software: Vec<SoftwareUse>,
    /// Non-null properties, in name order.
    pub properties: Vec<(String, Value)>,
}

/// One program that contributed to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareUse {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionsDocument {
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    software: BTreeMap<String, SoftwareRecord>,
}

#[derive(Debug, Deserialize)]
struct SoftwareRecord {
    #[serde(default)]
    version: Value,
    #[serde(default)]
    used: bool,
}

#[derive(Debug, Deserialize)]
struct DataDocument {
    #[serde(default)]
    properties: Map<String, Value>,
}

/// A property value converted to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl PropertyValue {
    /// Convert a JSON value to `ty`.
    ///
    /// Numbers accept JSON numbers and numeric strings; booleans accept JSON
    /// booleans and the strings `true`/`false`. Anything else is a mismatch.
    pub fn from_json(ty: PropertyType, value: &Value) -> std::result::Result<Self, String> {
        match (ty, value) {
            (PropertyType::String, Value::String(s)) => Ok(PropertyValue::String(s.clone())),
            (PropertyType::Number, Value::Number(n)) => n
                .as_f64()
                .map(PropertyValue::Number)
                .ok_or_else(|| format!("number {} out of range", n)),
            (PropertyType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(PropertyValue::Number)
                .map_err(|_| format!("expected a number, found {:?}", s)),
            (PropertyType::Boolean, Value::Bool(b)) => Ok(PropertyValue::Boolean(*b)),
            (PropertyType::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Ok(PropertyValue::Boolean(true)),
                "false" => Ok(PropertyValue::Boolean(false)),
                _ => Err(format!("expected a boolean, found {:?}", s)),
            },
            (ty, other) => Err(format!("expected a {}, found {}", ty, other)),
        }
    }

    pub fn to_sql(&self) -> rusqlite::types::Value {
        match self {
            PropertyValue::String(s) => rusqlite::types::Value::Text(s.clone()),
            PropertyValue::Number(n) => rusqlite::types::Value::Real(*n),
            PropertyValue::Boolean(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| ArchiveError::io_with_path(e, path))?;
    serde_json::from_str(&text).map_err(|e| ArchiveError::malformed(path, e.to_string()))
}

/// Version of a software record; `null`, missing, empty or `"null"` mean none.
fn software_version(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() || s == "null" => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_flag(data: &Map<String, Value>, key: &str, path: &Path) -> Result<bool> {
    match data.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ArchiveError::malformed(
            path,
            format!("{} must be a boolean, found {}", key, other),
        )),
        None => Err(ArchiveError::malformed(path, format!("missing {}", key))),
    }
}

fn optional_revision(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_date(properties: &Map<String, Value>, path: &Path) -> Result<NaiveDate> {
    let time = properties
        .get("TIME")
        .and_then(Value::as_str)
        .ok_or_else(|| ArchiveError::malformed(path, "missing TIME property"))?;
    let day = time.get(..10).unwrap_or(time);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ArchiveError::malformed(path, format!("invalid TIME {:?}: {}", time, e)))
}

/// Read and validate both documents of one snapshot.
pub fn read_entry_metadata(versions_path: &Path, data_path: &Path) -> Result<EntryMetadata> {
    let versions: VersionsDocument = read_json(versions_path)?;
    let data: DataDocument = read_json(data_path)?;

    let date = parse_date(&data.properties, data_path)?;

    let software = versions
        .software
        .into_iter()
        .filter(|(_, record)| record.used)
        .map(|(name, record)| SoftwareUse {
            version: software_version(&record.version),
            name,
        })
        .collect();

    let mut properties: Vec<(String, Value)> = data
        .properties
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    properties.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(EntryMetadata {
        date,
        coordinates_revision: optional_revision(&versions.data, "coordinates_revision"),
        reflections_revision: optional_revision(&versions.data, "reflections_revision"),
        coordinates_edited: required_flag(&versions.data, "coordinates_edited", versions_path)?,
        reflections_edited: required_flag(&versions.data, "reflections_edited", versions_path)?,
        software,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_docs(temp: &TempDir, versions: Value, data: Value) -> (std::path::PathBuf, std::path::PathBuf) {
        let v = temp.path().join("versions.json");
        let d = temp.path().join("data.json");
        std::fs::write(&v, versions.to_string()).unwrap();
        std::fs::write(&d, data.to_string()).unwrap();
        (v, d)
    }

    #[test]
    fn test_reads_complete_metadata() {
        let temp = TempDir::new().unwrap();
        let (v, d) = write_docs(
            &temp,
            json!({
                "data": {
                    "coordinates_revision": "3",
                    "reflections_revision": 7,
                    "coordinates_edited": true,
                    "reflections_edited": false
                },
                "software": {
                    "refmac": {"version": "5.8", "used": true},
                    "phenix": {"version": null, "used": true},
                    "coot": {"version": "0.9", "used": false},
                    "pdb-care": {"version": "null", "used": true}
                }
            }),
            json!({"properties": {"TIME": "2024-03-05T12:00:00", "RFREE": 0.21, "NOTE": null}}),
        );

        let meta = read_entry_metadata(&v, &d).unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(meta.coordinates_revision.as_deref(), Some("3"));
        assert_eq!(meta.reflections_revision, None);
        assert!(meta.coordinates_edited);
        assert!(!meta.reflections_edited);

        let names: Vec<_> = meta.software.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["pdb-care", "phenix", "refmac"]);
        assert!(meta.software.iter().all(|s| s.name == "refmac" || s.version.is_none()));

        let props: Vec<_> = meta.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(props, ["RFREE", "TIME"]);
    }

    #[test]
    fn test_missing_edit_flag_is_malformed() {
        let temp = TempDir::new().unwrap();
        let (v, d) = write_docs(
            &temp,
            json!({"data": {"coordinates_edited": true}}),
            json!({"properties": {"TIME": "2024-03-05"}}),
        );
        let err = read_entry_metadata(&v, &d).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let temp = TempDir::new().unwrap();
        let v = temp.path().join("versions.json");
        let d = temp.path().join("data.json");
        std::fs::write(&v, "{not json").unwrap();
        std::fs::write(&d, "{}").unwrap();
        let err = read_entry_metadata(&v, &d).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_missing_time_is_malformed() {
        let temp = TempDir::new().unwrap();
        let (v, d) = write_docs(
            &temp,
            json!({"data": {"coordinates_edited": false, "reflections_edited": false}}),
            json!({"properties": {"RFREE": 0.2}}),
        );
        assert!(matches!(
            read_entry_metadata(&v, &d).unwrap_err(),
            ArchiveError::MalformedMetadata { .. }
        ));
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(
            PropertyValue::from_json(PropertyType::Number, &json!("1.5")).unwrap(),
            PropertyValue::Number(1.5)
        );
        assert_eq!(
            PropertyValue::from_json(PropertyType::Boolean, &json!(true)).unwrap(),
            PropertyValue::Boolean(true)
        );
        assert!(PropertyValue::from_json(PropertyType::String, &json!(3)).is_err());
        assert!(PropertyValue::from_json(PropertyType::Number, &json!("high")).is_err());
        assert!(PropertyValue::from_json(PropertyType::Boolean, &json!(1)).is_err());
    }
}
