//! On-demand download assembly.

use super::kind::FileKind;
use super::paths::{normalize_identifier, snapshot_dir};
use super::sink::{ArchiveSink, ZipSink};
use crate::config::{BundleConfig, PathsConfig};
use crate::error::{ArchiveError, Result};
use flate2::read::MultiGzDecoder;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A download ready to be streamed to the client.
pub struct Materialized {
    pub reader: Box<dyn Read + Send>,
    /// Suggested name for the `Content-Disposition` header.
    pub file_name: String,
    pub content_type: &'static str,
    pub length: Option<u64>,
}

impl std::fmt::Debug for Materialized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materialized")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Resolves and packages files of one archive root.
#[derive(Debug, Clone)]
pub struct ArchiveAssembler {
    root: PathBuf,
}

impl ArchiveAssembler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the stored file for a single-file kind.
    ///
    /// Compressible kinds prefer the `.gz` file and fall back to the plain
    /// one. A missing file is [`ArchiveError::FileNotFound`] naming the
    /// preferred path.
    pub fn resolve_path(&self, identifier: &str, hash: &str, kind: FileKind) -> Result<PathBuf> {
        let file_name = kind.file_name().ok_or_else(|| ArchiveError::Validation {
            field: "kind".to_string(),
            message: "A bundle has no single backing file".to_string(),
        })?;
        let dir = snapshot_dir(&self.root, identifier, hash)?;

        let plain = dir.join(file_name);
        if kind.may_be_compressed() {
            let compressed = dir.join(format!("{}.{}", file_name, PathsConfig::GZIP_EXTENSION));
            if compressed.is_file() {
                return Ok(compressed);
            }
            if plain.is_file() {
                return Ok(plain);
            }
            return Err(ArchiveError::FileNotFound(compressed));
        }

        if plain.is_file() {
            Ok(plain)
        } else {
            Err(ArchiveError::FileNotFound(plain))
        }
    }

    /// Produce the download for `(identifier, hash, kind)`.
    pub fn materialize(&self, identifier: &str, hash: &str, kind: FileKind) -> Result<Materialized> {
        match kind {
            FileKind::Bundle => self.bundle(identifier, hash),
            _ => self.single(identifier, hash, kind),
        }
    }

    /// Stored bytes, as-is.
    fn single(&self, identifier: &str, hash: &str, kind: FileKind) -> Result<Materialized> {
        let path = self.resolve_path(identifier, hash, kind)?;
        let file = std::fs::File::open(&path).map_err(|e| ArchiveError::io_with_path(e, &path))?;
        let length = file.metadata().ok().map(|m| m.len());

        let stored_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content_type = if is_gzip(&path) {
            "application/gzip"
        } else {
            kind.content_type()
        };

        debug!("Serving {} for {} {}", path.display(), identifier, hash);

        Ok(Materialized {
            reader: Box::new(BufReader::new(file)),
            file_name: format!("{}_{}_{}", normalize_identifier(identifier), hash, stored_name),
            content_type,
            length,
        })
    }

    fn bundle(&self, identifier: &str, hash: &str) -> Result<Materialized> {
        let sink = ZipSink::new();
        let extension = sink.extension();
        let bytes = self.assemble_into(identifier, hash, sink)?;
        Ok(Materialized {
            length: Some(bytes.len() as u64),
            reader: Box::new(Cursor::new(bytes)),
            file_name: format!("{}_{}_all.{}", normalize_identifier(identifier), hash, extension),
            content_type: FileKind::Bundle.content_type(),
        })
    }

    /// Write all four constituents, decompressed, into `sink`.
    ///
    /// Every constituent is resolved before the first byte is written, so a
    /// missing file never yields a partial container.
    pub fn assemble_into<S: ArchiveSink>(&self, identifier: &str, hash: &str, mut sink: S) -> Result<Vec<u8>> {
        let paths = FileKind::CONSTITUENTS
            .iter()
            .map(|kind| self.resolve_path(identifier, hash, *kind).map(|p| (*kind, p)))
            .collect::<Result<Vec<_>>>()?;

        for (kind, path) in paths {
            let contents = read_decompressed(&path)?;
            let entry_name = kind.file_name().unwrap_or_default();
            sink.begin_entry(entry_name, BundleConfig::ENTRY_MODE)?;
            for chunk in contents.chunks(BundleConfig::CHUNK_SIZE) {
                sink.write_chunk(chunk)?;
            }
        }

        let bytes = sink.finish()?;
        debug!(
            "Assembled {} byte bundle for {} {}",
            bytes.len(),
            identifier,
            hash
        );
        Ok(bytes)
    }

    /// Contents of a single-file kind with gzip compression removed.
    pub fn read_decompressed_kind(&self, identifier: &str, hash: &str, kind: FileKind) -> Result<Vec<u8>> {
        let path = self.resolve_path(identifier, hash, kind)?;
        read_decompressed(&path)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PathsConfig::GZIP_EXTENSION)
}

/// Read a file fully, gunzipping `.gz` files.
fn read_decompressed(path: &Path) -> Result<Vec<u8>> {
    let raw = std::fs::read(path).map_err(|e| ArchiveError::io_with_path(e, path))?;
    if !is_gzip(path) {
        return Ok(raw);
    }

    let mut out = Vec::new();
    MultiGzDecoder::new(raw.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Io {
            message: format!("Failed to decompress: {}", e),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn write_snapshot(root: &Path, compressed: bool) -> PathBuf {
        let dir = root.join("ab").join("1abc").join("attic").join("f00d");
        std::fs::create_dir_all(&dir).unwrap();
        if compressed {
            std::fs::write(dir.join("final.cif.gz"), gzip(b"data_1abc\n")).unwrap();
            std::fs::write(dir.join("final.mtz.gz"), gzip(b"MTZ \x00\x01")).unwrap();
        } else {
            std::fs::write(dir.join("final.cif"), b"data_1abc\n").unwrap();
            std::fs::write(dir.join("final.mtz"), b"MTZ \x00\x01").unwrap();
        }
        std::fs::write(dir.join("data.json"), br#"{"properties":{}}"#).unwrap();
        std::fs::write(dir.join("versions.json"), br#"{"data":{}}"#).unwrap();
        dir
    }

    #[test]
    fn test_single_file_is_served_as_stored() {
        let temp = TempDir::new().unwrap();
        write_snapshot(temp.path(), true);
        let assembler = ArchiveAssembler::new(temp.path());

        let mut m = assembler.materialize("1abc", "f00d", FileKind::Coordinates).unwrap();
        assert_eq!(m.file_name, "1abc_f00d_final.cif.gz");
        assert_eq!(m.content_type, "application/gzip");

        let mut bytes = Vec::new();
        m.reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, gzip(b"data_1abc\n"));
    }

    #[test]
    fn test_uncompressed_fallback() {
        let temp = TempDir::new().unwrap();
        write_snapshot(temp.path(), false);
        let assembler = ArchiveAssembler::new(temp.path());

        let m = assembler.materialize("1ABC", "f00d", FileKind::Coordinates).unwrap();
        assert_eq!(m.file_name, "1abc_f00d_final.cif");
        assert_eq!(m.content_type, "text/plain");
    }

    #[test]
    fn test_missing_single_file() {
        let temp = TempDir::new().unwrap();
        let assembler = ArchiveAssembler::new(temp.path());
        let err = assembler.materialize("1abc", "f00d", FileKind::Data).unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound(_)));
    }

    #[test]
    fn test_bundle_missing_constituent_aborts() {
        let temp = TempDir::new().unwrap();
        let dir = write_snapshot(temp.path(), true);
        std::fs::remove_file(dir.join("final.mtz.gz")).unwrap();

        let assembler = ArchiveAssembler::new(temp.path());
        let err = assembler.materialize("1abc", "f00d", FileKind::Bundle).unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound(_)));
    }

    #[test]
    fn test_bundle_name_and_entries() {
        let temp = TempDir::new().unwrap();
        write_snapshot(temp.path(), true);
        let assembler = ArchiveAssembler::new(temp.path());

        let mut m = assembler.materialize("1abc", "f00d", FileKind::Bundle).unwrap();
        assert_eq!(m.file_name, "1abc_f00d_all.zip");
        assert!(m.file_name.ends_with(&format!(".{}", ZipSink::new().extension())));
        assert_eq!(m.content_type, "application/zip");

        let mut bytes = Vec::new();
        m.reader.read_to_end(&mut bytes).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, ["data.json", "final.cif", "final.mtz", "versions.json"]);
    }
}
