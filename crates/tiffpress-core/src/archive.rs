//! Flat ZIP packaging of converted images.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Download name of the archive.
pub const ARCHIVE_FILE_NAME: &str = "converted_images.zip";

/// MIME type of the archive.
pub const ARCHIVE_MIME: &str = "application/zip";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to add {name} to archive: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write data for {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize archive: {0}")]
    Finish(#[source] zip::result::ZipError),
}

/// Archive entry name for an uploaded file: its base name with the extension
/// replaced by `.jpg`.
///
/// Directory components (including `..`) are stripped. Returns `None` when
/// nothing usable is left.
pub fn entry_name_for(upload_name: &str) -> Option<String> {
    // Browsers on Windows may send backslash-separated paths.
    let base = upload_name.rsplit(['/', '\\']).next().unwrap_or(upload_name);
    let stem = Path::new(base).file_stem().and_then(|s| s.to_str())?;

    if stem.is_empty() || stem == "." || stem == ".." {
        return None;
    }
    Some(format!("{stem}.jpg"))
}

/// Hands out unique archive entry names.
///
/// A name that was already used gets a numeric suffix (`a.jpg`, `a_1.jpg`,
/// ...); an unusable upload name becomes `image_<n>.jpg`.
#[derive(Debug, Default)]
pub struct EntryNamer {
    used: HashSet<String>,
}

impl EntryNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return the entry name for `upload_name`.
    pub fn assign(&mut self, upload_name: &str) -> String {
        let name = self.propose(upload_name);
        self.reserve(&name);
        name
    }

    /// The name `assign` would hand out, without reserving it.
    pub fn propose(&self, upload_name: &str) -> String {
        let fallback = format!("image_{}.jpg", self.used.len() + 1);
        let name = entry_name_for(upload_name).unwrap_or(fallback);

        if !self.used.contains(&name) {
            return name;
        }

        let stem = name.strip_suffix(".jpg").unwrap_or(&name);
        (1..)
            .map(|n| format!("{stem}_{n}.jpg"))
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_else(|| name.clone())
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }
}

/// Accumulates named JPEG blobs into an in-memory ZIP.
///
/// Entries are stored uncompressed since the payloads already are. Every
/// `add` produces exactly one entry.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    namer: EntryNamer,
    count: usize,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            namer: EntryNamer::new(),
            count: 0,
        }
    }

    /// Add one entry. Returns the name it was stored under.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        let name = self.namer.assign(name);

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);

        self.zip
            .start_file(name.as_str(), options)
            .map_err(|source| ArchiveError::Entry {
                name: name.clone(),
                source,
            })?;
        self.zip
            .write_all(bytes)
            .map_err(|source| ArchiveError::Write {
                name: name.clone(),
                source,
            })?;

        self.count += 1;
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Finalize the central directory and return the ZIP bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.zip.finish().map_err(ArchiveError::Finish)?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}
