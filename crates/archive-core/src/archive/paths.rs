//! Identifier sharding and snapshot path resolution.

use crate::config::PathsConfig;
use crate::error::{ArchiveError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{3,32}$").unwrap());

static HASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,128}$").unwrap());

/// Lower-case form used for directories and the store.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.to_ascii_lowercase()
}

/// Characters 2–3 of the identifier, e.g. `ab` for `1abc`.
pub fn shard_prefix(identifier: &str) -> Option<&str> {
    identifier.get(1..1 + PathsConfig::SHARD_PREFIX_LEN)
}

/// Reject identifiers that could escape the archive root.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(identifier) {
        Ok(())
    } else {
        Err(ArchiveError::Validation {
            field: "identifier".to_string(),
            message: format!("Invalid identifier: {:?}", identifier),
        })
    }
}

pub fn validate_hash(hash: &str) -> Result<()> {
    if HASH_RE.is_match(hash) {
        Ok(())
    } else {
        Err(ArchiveError::Validation {
            field: "hash".to_string(),
            message: format!("Invalid hash: {:?}", hash),
        })
    }
}

/// `root/{prefix}/{identifier}/attic/{hash}`.
pub fn snapshot_dir(root: &Path, identifier: &str, hash: &str) -> Result<PathBuf> {
    validate_identifier(identifier)?;
    validate_hash(hash)?;

    let identifier = normalize_identifier(identifier);
    let prefix = shard_prefix(&identifier).ok_or_else(|| ArchiveError::Validation {
        field: "identifier".to_string(),
        message: format!("Identifier too short for sharding: {}", identifier),
    })?;

    Ok(root
        .join(prefix)
        .join(&identifier)
        .join(PathsConfig::ATTIC_DIR_NAME)
        .join(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_prefix() {
        assert_eq!(shard_prefix("1abc"), Some("ab"));
        assert_eq!(shard_prefix("2xyz"), Some("xy"));
        assert_eq!(shard_prefix("1a"), None);
    }

    #[test]
    fn test_snapshot_dir_lowercases() {
        let dir = snapshot_dir(Path::new("/srv/pdb-redo"), "1ABC", "f00d").unwrap();
        assert_eq!(dir, PathBuf::from("/srv/pdb-redo/ab/1abc/attic/f00d"));
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(snapshot_dir(Path::new("/srv"), "../etc", "f00d").is_err());
        assert!(snapshot_dir(Path::new("/srv"), "1abc", "../../x").is_err());
        assert!(snapshot_dir(Path::new("/srv"), "1abc", "").is_err());
    }
}
