//! Discovery of snapshot directories in the sharded archive tree.

use crate::archive::{normalize_identifier, shard_prefix};
use crate::config::PathsConfig;
use crate::error::{ArchiveError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One `(identifier, hash)` snapshot found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub identifier: String,
    pub hash: String,
    pub dir: PathBuf,
}

impl Candidate {
    pub fn versions_path(&self) -> PathBuf {
        self.dir.join(PathsConfig::VERSIONS_FILE_NAME)
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join(PathsConfig::DATA_FILE_NAME)
    }
}

/// Immediate subdirectories of `dir`, sorted by file name.
fn subdirectories(dir: &Path) -> impl Iterator<Item = (String, PathBuf)> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            Some((name, e.into_path()))
        })
}

/// Walk `root/{prefix}/{identifier}/attic/{hash}` and collect every snapshot
/// that has both metadata documents.
pub fn scan(root: &Path) -> Result<Vec<Candidate>> {
    if !root.is_dir() {
        return Err(ArchiveError::Io {
            message: "Archive root is not a directory".to_string(),
            path: Some(root.to_path_buf()),
            source: None,
        });
    }

    let mut candidates = Vec::new();

    for (shard, shard_dir) in subdirectories(root) {
        if shard.chars().count() != PathsConfig::SHARD_PREFIX_LEN {
            continue;
        }

        for (name, entry_dir) in subdirectories(&shard_dir) {
            let identifier = normalize_identifier(&name);
            if shard_prefix(&identifier) != Some(shard.to_ascii_lowercase().as_str()) {
                warn!(
                    "Skipping {}: identifier does not belong in shard {}",
                    entry_dir.display(),
                    shard
                );
                continue;
            }

            let attic = entry_dir.join(PathsConfig::ATTIC_DIR_NAME);
            if !attic.is_dir() {
                continue;
            }

            for (hash, dir) in subdirectories(&attic) {
                let candidate = Candidate {
                    identifier: identifier.clone(),
                    hash,
                    dir,
                };
                if candidate.versions_path().is_file() && candidate.data_path().is_file() {
                    candidates.push(candidate);
                } else {
                    debug!("Skipping incomplete snapshot {}", candidate.dir.display());
                }
            }
        }
    }

    debug!("Found {} candidates under {}", candidates.len(), root.display());
    Ok(candidates)
}
