//! Shared fixtures: an archive tree and database inside a temp dir.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use pdb_archive::{ArchiveApi, PropertyTypeRegistry, Store};
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const SCHEMA_POINTER: &str = "/properties/properties/properties";

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "properties": {
                "type": "object",
                "properties": {
                    "TIME": {"type": "string"},
                    "RFREE": {"type": ["number", "null"]},
                    "RESOLUTION": {"type": "number"},
                    "HAS_LIGAND": {"type": "boolean"},
                    "SPACEGROUP": {"type": "string"},
                    "NCHAINS": {"type": "integer"}
                }
            }
        }
    })
}

pub fn registry() -> Arc<PropertyTypeRegistry> {
    Arc::new(PropertyTypeRegistry::load(&schema(), SCHEMA_POINTER).unwrap())
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Test archive: `root/` tree plus `archive.db`, reset on creation.
pub struct Fixture {
    pub temp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(temp.path().join("root")).unwrap();
        let fixture = Self { temp };
        fixture.store().reset(Some("archivist")).unwrap();
        fixture
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("root")
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp.path().join("archive.db")
    }

    pub fn store(&self) -> Store {
        Store::new(self.db_path())
    }

    pub fn api(&self) -> ArchiveApi {
        ArchiveApi::builder(self.root(), self.db_path())
            .schema_value(schema())
            .owner(Some("archivist".to_string()))
            .build()
            .unwrap()
    }

    /// Start describing a snapshot of `identifier` at `hash`.
    pub fn snapshot(&self, identifier: &str, hash: &str) -> SnapshotBuilder {
        SnapshotBuilder {
            root: self.root(),
            identifier: identifier.to_string(),
            hash: hash.to_string(),
            date: "2024-01-01".to_string(),
            software: serde_json::Map::new(),
            properties: serde_json::Map::new(),
            versions_data: json!({
                "coordinates_revision": "1",
                "reflections_revision": "1",
                "coordinates_edited": false,
                "reflections_edited": false
            }),
        }
    }
}

pub struct SnapshotBuilder {
    root: PathBuf,
    identifier: String,
    hash: String,
    date: String,
    software: serde_json::Map<String, Value>,
    properties: serde_json::Map<String, Value>,
    versions_data: Value,
}

impl SnapshotBuilder {
    pub fn date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn software(mut self, name: &str, version: Option<&str>) -> Self {
        self.software
            .insert(name.to_string(), json!({"version": version, "used": true}));
        self
    }

    pub fn unused_software(mut self, name: &str, version: &str) -> Self {
        self.software
            .insert(name.to_string(), json!({"version": version, "used": false}));
        self
    }

    pub fn property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn versions_data(mut self, data: Value) -> Self {
        self.versions_data = data;
        self
    }

    /// Write all four files and return the snapshot directory.
    pub fn write(self) -> PathBuf {
        let prefix = &self.identifier[1..3];
        let dir = self
            .root
            .join(prefix)
            .join(&self.identifier)
            .join("attic")
            .join(&self.hash);
        std::fs::create_dir_all(&dir).unwrap();

        let mut properties = self.properties;
        properties.insert("TIME".to_string(), Value::String(format!("{}T10:00:00", self.date)));

        write_json(
            &dir.join("versions.json"),
            &json!({"data": self.versions_data, "software": self.software}),
        );
        write_json(&dir.join("data.json"), &json!({"properties": properties}));
        std::fs::write(
            dir.join("final.cif.gz"),
            gzip(format!("data_{}\n_entry.id {}\n", self.identifier, self.hash).as_bytes()),
        )
        .unwrap();
        std::fs::write(
            dir.join("final.mtz.gz"),
            gzip(format!("MTZ {} {}", self.identifier, self.hash).as_bytes()),
        )
        .unwrap();
        dir
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}
