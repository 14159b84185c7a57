//! Error types for the archive data service.
//!
//! Import failures are isolated per candidate and only logged, while query and
//! download errors travel back to the HTTP layer, which uses
//! [`ArchiveError::status_code`] to pick a response.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the archive library.
#[derive(Debug, Error)]
pub enum ArchiveError {
    // Store errors
    #[error("Cannot connect to store: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Import errors
    #[error("Malformed metadata in {path:?}: {message}")]
    MalformedMetadata { path: PathBuf, message: String },

    #[error("Unknown property: {name}")]
    UnknownProperty { name: String },

    // Query errors
    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error("No entry with hash {hash}")]
    EntryNotFound { hash: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Archive assembly failed: {message}")]
    Archive {
        message: String,
        #[source]
        source: Option<zip::result::ZipError>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(err: rusqlite::Error) -> Self {
        ArchiveError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Archive {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ArchiveError {
    /// Create an IO error with path context.
    ///
    /// A `NotFound` IO error becomes [`ArchiveError::FileNotFound`] so callers
    /// can answer with a "not found" response.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            return ArchiveError::FileNotFound(path);
        }
        ArchiveError::Io {
            message: err.to_string(),
            path: Some(path),
            source: Some(err),
        }
    }

    /// Create a malformed-metadata error for the file at `path`.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ArchiveError::MalformedMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        ArchiveError::InvalidFilter {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the request rather than the server.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ArchiveError::InvalidFilter { .. }
                | ArchiveError::UnknownProperty { .. }
                | ArchiveError::Validation { .. }
        )
    }

    /// Returns true for errors the HTTP layer reports as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ArchiveError::FileNotFound(_) | ArchiveError::EntryNotFound { .. }
        )
    }

    /// Map to an HTTP status code for the external HTTP layer.
    ///
    /// - 404: missing file or entry
    /// - 400: invalid filter, unknown property, validation failure
    /// - 503: store unreachable
    /// - 500: everything else
    pub fn status_code(&self) -> u16 {
        if self.is_not_found() {
            404
        } else if self.is_caller_error() {
            400
        } else if matches!(self, ArchiveError::Connection { .. }) {
            503
        } else {
            500
        }
    }
}
