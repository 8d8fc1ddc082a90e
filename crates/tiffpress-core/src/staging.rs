//! Where converted JPEGs wait between compression and archiving.
//!
//! `Memory` keeps every artifact as a byte buffer. `TempDir` writes each one
//! into a per-batch temporary directory and reads it back when the archive is
//! built, trading disk I/O for a smaller resident set on large batches. The
//! directory is removed when the [`StagingArea`] is dropped, whichever way the
//! batch ends.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::archive::{ArchiveError, ArchiveWriter, EntryNamer};
use crate::compress::EncodedArtifact;

/// Staging strategy for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Staging {
    #[default]
    Memory,
    TempDir,
}

impl FromStr for Staging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Staging::Memory),
            "tempdir" | "temp" | "disk" => Ok(Staging::TempDir),
            other => Err(format!(
                "unknown staging mode '{other}' (expected 'memory' or 'tempdir')"
            )),
        }
    }
}

impl fmt::Display for Staging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staging::Memory => f.write_str("memory"),
            Staging::TempDir => f.write_str("tempdir"),
        }
    }
}

enum Staged {
    Bytes { name: String, bytes: Vec<u8> },
    File { name: String, path: PathBuf },
}

/// Failure while reading a staged file back for archiving.
#[derive(Debug, thiserror::Error)]
pub enum UnstageError {
    #[error("Failed to read staged file {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Request-scoped holding area for converted artifacts.
pub struct StagingArea {
    dir: Option<TempDir>,
    namer: EntryNamer,
    staged: Vec<Staged>,
}

impl StagingArea {
    /// Open a staging area. `TempDir` creates the directory immediately.
    pub fn open(mode: Staging) -> std::io::Result<Self> {
        let dir = match mode {
            Staging::Memory => None,
            Staging::TempDir => Some(tempfile::Builder::new().prefix("tiffpress-").tempdir()?),
        };
        let area = Self {
            dir,
            namer: EntryNamer::new(),
            staged: Vec::new(),
        };
        if let Some(path) = area.path() {
            tracing::debug!(path = %path.display(), "Created staging directory");
        }
        Ok(area)
    }

    /// Directory backing this area, if any.
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Stage one artifact for `upload_name`. Returns the archive entry name.
    ///
    /// The name is only reserved once the artifact is safely staged, so a
    /// failed write leaves no gap in the archive.
    pub fn stage(
        &mut self,
        upload_name: &str,
        artifact: EncodedArtifact,
    ) -> std::io::Result<String> {
        let name = self.namer.propose(upload_name);

        let entry = match &self.dir {
            None => Staged::Bytes {
                name: name.clone(),
                bytes: artifact.into_bytes(),
            },
            Some(dir) => {
                let path = dir.path().join(&name);
                artifact.write_to(BufWriter::new(File::create(&path)?))?;
                Staged::File {
                    name: name.clone(),
                    path,
                }
            }
        };

        self.namer.reserve(&name);
        self.staged.push(entry);
        Ok(name)
    }

    /// Build the ZIP from everything staged, in staging order.
    pub fn into_archive(self) -> Result<Vec<u8>, UnstageError> {
        let mut writer = ArchiveWriter::new();

        for staged in &self.staged {
            match staged {
                Staged::Bytes { name, bytes } => {
                    writer.add(name, bytes)?;
                }
                Staged::File { name, path } => {
                    let bytes = std::fs::read(path).map_err(|source| UnstageError::Read {
                        name: name.clone(),
                        source,
                    })?;
                    writer.add(name, &bytes)?;
                }
            }
        }

        Ok(writer.finish()?)
    }
}
