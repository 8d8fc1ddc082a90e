//! tiffpress core - TIFF to size-capped JPEG conversion
//!
//! This crate turns uploaded TIF/TIFF images into JPEGs of an exact pixel
//! size, lowers JPEG quality until each output fits under a byte budget
//! (3 MB by default), and packages the results into one ZIP archive.
//!
//! Everything here is synchronous. A batch is processed one file at a time;
//! callers that run inside an async runtime should move it onto a blocking
//! thread.
//!
//! # Example
//!
//! ```ignore
//! use tiffpress_core::{convert_batch, BatchRequest, TargetDimensions, UploadedFile};
//!
//! let files = vec![UploadedFile::new("scan.tif", std::fs::read("scan.tif")?)];
//! let request = BatchRequest::new(files, TargetDimensions::new(800, 600)?);
//! let report = convert_batch(request)?;
//! if let Some(zip) = report.archive {
//!     std::fs::write("converted_images.zip", zip)?;
//! }
//! ```

pub mod archive;
pub mod batch;
pub mod compress;
pub mod decode;
pub mod encode;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{entry_name_for, ArchiveError, ArchiveWriter, ARCHIVE_FILE_NAME, ARCHIVE_MIME};
pub use batch::{
    convert_batch, convert_file, is_accepted_extension, BatchError, BatchReport, BatchRequest,
    ConvertError, ConvertedFile, FileOutcome, UploadedFile,
};
pub use compress::{
    compress, compress_to_path, compress_with, CompressError, CompressOptions, EncodedArtifact,
    QualityLevel, SizeBudget, TargetDimensions, DEFAULT_BUDGET_BYTES, MAX_SIDE,
};
pub use decode::{DecodeError, DecodedImage, FilterType, MAX_RESIZE_PIXELS};
pub use staging::Staging;
