//! Downloadable file kinds.

use crate::config::PathsConfig;
use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};

/// What `materialize` should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Coordinate model, `final.cif(.gz)`.
    #[serde(rename = "cif")]
    Coordinates,
    /// Reflection data, `final.mtz(.gz)`.
    #[serde(rename = "mtz")]
    Reflections,
    /// `data.json`.
    Data,
    /// `versions.json`.
    Versions,
    /// All four files in one zip.
    #[serde(rename = "zip")]
    Bundle,
}

impl FileKind {
    /// The single-file kinds, in bundle order.
    pub const CONSTITUENTS: [FileKind; 4] = [
        FileKind::Coordinates,
        FileKind::Reflections,
        FileKind::Data,
        FileKind::Versions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Coordinates => "cif",
            FileKind::Reflections => "mtz",
            FileKind::Data => "data",
            FileKind::Versions => "versions",
            FileKind::Bundle => "zip",
        }
    }

    /// Case-insensitive parse of the kind names used in download URLs.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cif" | "coordinates" => Ok(FileKind::Coordinates),
            "mtz" | "reflections" => Ok(FileKind::Reflections),
            "data" => Ok(FileKind::Data),
            "versions" => Ok(FileKind::Versions),
            "zip" | "bundle" => Ok(FileKind::Bundle),
            _ => Err(ArchiveError::Validation {
                field: "kind".to_string(),
                message: format!("Invalid file type specified: {}", s),
            }),
        }
    }

    /// Uncompressed file name; `None` for the bundle.
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            FileKind::Coordinates => Some(PathsConfig::COORDINATES_FILE_NAME),
            FileKind::Reflections => Some(PathsConfig::REFLECTIONS_FILE_NAME),
            FileKind::Data => Some(PathsConfig::DATA_FILE_NAME),
            FileKind::Versions => Some(PathsConfig::VERSIONS_FILE_NAME),
            FileKind::Bundle => None,
        }
    }

    /// Whether the pipeline may store this kind gzip-compressed.
    pub fn may_be_compressed(&self) -> bool {
        matches!(self, FileKind::Coordinates | FileKind::Reflections)
    }

    /// Content type of the uncompressed file.
    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Coordinates => "text/plain",
            FileKind::Reflections => "application/octet-stream",
            FileKind::Data | FileKind::Versions => "application/json",
            FileKind::Bundle => "application/zip",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
