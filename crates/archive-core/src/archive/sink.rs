//! Archive container sinks.
//!
//! A sink receives entries one at a time as ordered byte chunks and produces
//! the finished container when told to finish.

use crate::config::BundleConfig;
use crate::error::{ArchiveError, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Ordered-chunk writer for one archive container.
pub trait ArchiveSink {
    /// File extension of the finished container, without the dot.
    fn extension(&self) -> &'static str;

    /// Start a new entry. Ends the previous one, if any.
    fn begin_entry(&mut self, name: &str, mode: u32) -> Result<()>;

    /// Append bytes to the current entry.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the container and return its bytes.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// In-memory zip container, deflate-compressed.
pub struct ZipSink {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    in_entry: bool,
}

impl ZipSink {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            in_entry: false,
        }
    }
}

impl Default for ZipSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveSink for ZipSink {
    fn extension(&self) -> &'static str {
        BundleConfig::EXTENSION
    }

    fn begin_entry(&mut self, name: &str, mode: u32) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode);
        self.writer.start_file(name.to_string(), options)?;
        self.in_entry = true;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if !self.in_entry {
            return Err(ArchiveError::Archive {
                message: "write_chunk called before begin_entry".to_string(),
                source: None,
            });
        }
        self.writer.write_all(chunk)?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}
