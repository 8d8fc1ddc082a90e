//! Request-scoped conversion of a set of uploads into one archive.
//!
//! Files are processed one after another in upload order. A file that fails
//! (wrong extension, undecodable, encoder error, staging write error) is
//! recorded and skipped; it never aborts the rest of the batch. The archive is
//! only built when at least one file converted.

use serde::Serialize;
use thiserror::Error;

use crate::compress::{self, CompressError, EncodedArtifact, SizeBudget, TargetDimensions};
use crate::decode::{self, DecodeError};
use crate::staging::{Staging, StagingArea, UnstageError};

/// Upload extensions the converter accepts (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Whether `name` carries one of [`ACCEPTED_EXTENSIONS`].
pub fn is_accepted_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// One uploaded file: its client-side name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub files: Vec<UploadedFile>,
    /// Applied uniformly to every file.
    pub dimensions: TargetDimensions,
    pub budget: SizeBudget,
    pub staging: Staging,
}

impl BatchRequest {
    pub fn new(files: Vec<UploadedFile>, dimensions: TargetDimensions) -> Self {
        Self {
            files,
            dimensions,
            budget: SizeBudget::default(),
            staging: Staging::default(),
        }
    }

    pub fn with_budget(mut self, budget: SizeBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_staging(mut self, staging: Staging) -> Self {
        self.staging = staging;
        self
    }
}

/// Why a single file did not make it into the archive.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported file type (expected .tif or .tiff)")]
    UnsupportedExtension,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error("could not stage converted image: {0}")]
    Staging(#[from] std::io::Error),
}

impl ConvertError {
    /// Short machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedExtension => "unsupported_extension",
            ConvertError::Decode(_) => "decode_failed",
            ConvertError::Compress(_) => "encode_failed",
            ConvertError::Staging(_) => "staging_failed",
        }
    }
}

/// Batch-level failure: the archive itself could not be produced.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to create staging area: {0}")]
    StagingSetup(#[source] std::io::Error),

    #[error(transparent)]
    Archive(#[from] UnstageError),
}

/// Summary of a converted file. The JPEG bytes themselves live in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedFile {
    pub source_name: String,
    pub entry_name: String,
    pub quality: u8,
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub within_budget: bool,
    pub attempts: u32,
}

impl ConvertedFile {
    /// Summary of `artifact`; `entry_name` is left empty until staged.
    fn describe(source_name: &str, artifact: &EncodedArtifact) -> Self {
        Self {
            source_name: source_name.to_string(),
            entry_name: String::new(),
            quality: artifact.quality,
            size: artifact.len(),
            width: artifact.width,
            height: artifact.height,
            within_budget: artifact.within_budget(),
            attempts: artifact.attempts,
        }
    }
}

/// Result for one uploaded file.
#[derive(Debug)]
pub enum FileOutcome {
    Converted(ConvertedFile),
    Failed {
        source_name: String,
        error: ConvertError,
    },
}

impl FileOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            FileOutcome::Converted(file) => &file.source_name,
            FileOutcome::Failed { source_name, .. } => source_name,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted(_))
    }

    /// User-facing message for a failed file.
    pub fn error_message(&self) -> Option<String> {
        match self {
            FileOutcome::Converted(_) => None,
            FileOutcome::Failed { source_name, error } => {
                Some(format!("Error converting {source_name}: {error}"))
            }
        }
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per uploaded file, in upload order.
    pub outcomes: Vec<FileOutcome>,
    /// ZIP bytes; present iff at least one file converted.
    pub archive: Option<Vec<u8>>,
}

impl BatchReport {
    pub fn converted(&self) -> impl Iterator<Item = &ConvertedFile> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Converted(file) => Some(file),
            FileOutcome::Failed { .. } => None,
        })
    }

    pub fn converted_count(&self) -> usize {
        self.converted().count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.converted_count()
    }

    /// User-facing messages, one per failed file.
    pub fn error_messages(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::error_message)
            .collect()
    }

    pub fn has_download(&self) -> bool {
        self.archive.is_some()
    }
}

/// Decode and compress one upload.
pub fn convert_file(
    file: &UploadedFile,
    dimensions: TargetDimensions,
    budget: SizeBudget,
) -> Result<EncodedArtifact, ConvertError> {
    if !is_accepted_extension(&file.name) {
        return Err(ConvertError::UnsupportedExtension);
    }

    let image = decode::decode_image(&file.bytes)?;
    tracing::debug!(
        file = %file.name,
        source_width = image.width,
        source_height = image.height,
        "Decoded upload"
    );

    Ok(compress::compress(&image, dimensions, budget)?)
}

/// Convert every file in `request` and package the successes.
///
/// # Errors
///
/// Per-file problems are reported in the returned [`BatchReport`]. An error is
/// only returned when the staging area cannot be created or the archive cannot
/// be assembled.
pub fn convert_batch(request: BatchRequest) -> Result<BatchReport, BatchError> {
    if request.files.is_empty() {
        tracing::debug!("No files uploaded; nothing to convert");
        return Ok(BatchReport::default());
    }

    let mut staging = StagingArea::open(request.staging).map_err(BatchError::StagingSetup)?;
    let mut outcomes = Vec::with_capacity(request.files.len());

    for file in &request.files {
        let result = convert_file(file, request.dimensions, request.budget).and_then(|artifact| {
            let summary = ConvertedFile::describe(&file.name, &artifact);
            let entry_name = staging.stage(&file.name, artifact)?;
            Ok(ConvertedFile {
                entry_name,
                ..summary
            })
        });

        match result {
            Ok(converted) => {
                tracing::info!(
                    file = %converted.source_name,
                    entry = %converted.entry_name,
                    quality = converted.quality,
                    size = converted.size,
                    "Converted"
                );
                outcomes.push(FileOutcome::Converted(converted));
            }
            Err(error) => {
                tracing::warn!(file = %file.name, error = %error, kind = error.kind(), "Conversion failed");
                outcomes.push(FileOutcome::Failed {
                    source_name: file.name.clone(),
                    error,
                });
            }
        }
    }

    let archive = if staging.is_empty() {
        None
    } else {
        Some(staging.into_archive()?)
    };

    let report = BatchReport { outcomes, archive };
    tracing::info!(
        files = report.outcomes.len(),
        converted = report.converted_count(),
        failed = report.failed_count(),
        archive_bytes = report.archive.as_ref().map(Vec::len).unwrap_or(0),
        "Batch finished"
    );

    Ok(report)
}
