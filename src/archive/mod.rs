//! Zip container decode/encode
//!
//! The whole archive is held in memory: input is a byte buffer, entries are
//! decoded eagerly in archive order, and the output archive is encoded into
//! a fresh buffer.

use std::fmt;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::OutputCompression;
use crate::error::ArchiveError;

/// Local file header signature
const LOCAL_HEADER_SIGNATURE: &[u8; 4] = b"PK\x03\x04";
/// End of central directory signature (archive with no entries)
const EMPTY_ARCHIVE_SIGNATURE: &[u8; 4] = b"PK\x05\x06";
/// Deflate cannot expand input by more than this factor
const MAX_EXPANSION_RATIO: u64 = 1032;

/// A named blob read from (or staged for) an archive
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Logical path inside the archive
    pub path: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

impl fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Check the leading zip record signature
pub fn has_zip_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(LOCAL_HEADER_SIGNATURE) || bytes.starts_with(EMPTY_ARCHIVE_SIGNATURE)
}

/// Decode every file entry of a zip buffer, in archive order
///
/// Directory entries are skipped. An entry whose declared size exceeds what
/// the buffer could hold, or disagrees with the bytes actually stored, fails
/// the whole read.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    if !has_zip_signature(bytes) {
        return Err(ArchiveError::BadSignature);
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let max_entry_size = (bytes.len() as u64).saturating_mul(MAX_EXPANSION_RATIO);
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let path = file.name().to_string();
        let declared = file.size();
        if declared > max_entry_size {
            return Err(ArchiveError::SizeMismatch {
                path,
                declared,
                actual: None,
            });
        }

        let mut data = Vec::new();
        (&mut file)
            .take(declared.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 != declared {
            return Err(ArchiveError::SizeMismatch {
                path,
                declared,
                actual: Some(data.len() as u64),
            });
        }
        entries.push(ArchiveEntry { path, data });
    }

    log::debug!("Decoded {} entries from archive", entries.len());
    Ok(entries)
}

fn compression_method(compression: OutputCompression) -> CompressionMethod {
    match compression {
        OutputCompression::Deflated => CompressionMethod::Deflated,
        OutputCompression::Stored => CompressionMethod::Stored,
    }
}

/// Encode staged entries into a new zip buffer, preserving their order
pub fn write_archive(
    entries: &[ArchiveEntry],
    compression: OutputCompression,
) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(compression_method(compression));

    for entry in entries {
        writer.start_file(entry.path.as_str(), options)?;
        writer.write_all(&entry.data)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
