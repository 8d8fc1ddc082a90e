//! Size-capped JPEG compression.
//!
//! The compressor resizes an image to the requested dimensions once, then
//! encodes it at decreasing quality levels until the output fits under a byte
//! budget or the quality floor is reached. Reaching the floor without meeting
//! the budget is not an error: the last (smallest-quality) artifact is
//! returned and flagged as over budget.
//!
//! # Quality Schedule
//!
//! With the default options the schedule is 95, 90, 85, ... 15, 10: at most
//! eighteen encodes per image, each a full re-encode of the same resized
//! buffer.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{self, DecodeError, DecodedImage, FilterType, MAX_RESIZE_PIXELS};
use crate::encode::{encode_jpeg_image, EncodeError};

/// Default output ceiling: 3 MB.
pub const DEFAULT_BUDGET_BYTES: u64 = 3 * 1024 * 1024;

/// Largest side a baseline JPEG can carry.
pub const MAX_SIDE: u32 = 65_535;

/// Errors raised by the compressor. Missing the budget is not one of them.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Target size is zero on one side, wider or taller than [`MAX_SIDE`], or
    /// larger in area than [`MAX_RESIZE_PIXELS`].
    #[error(
        "Invalid target dimensions {width}x{height}: each side must be 1 to 65535 pixels \
         and the area at most 67108864 pixels"
    )]
    InvalidDimensions { width: u32, height: u32 },

    /// A budget of zero bytes (or one that overflows when scaled to bytes).
    #[error("Size budget must be greater than zero")]
    InvalidBudget,

    /// Inconsistent quality schedule in [`CompressOptions`].
    #[error("Invalid compression options: {0}")]
    InvalidOptions(String),

    /// The resize step rejected the source image.
    #[error("Resize failed: {0}")]
    Resize(#[from] DecodeError),

    /// The JPEG encoder failed on an attempt.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Writing the chosen artifact to disk failed.
    #[error("Failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Exact output size in pixels.
///
/// Both sides lie in `1..=MAX_SIDE` and the area is at most
/// [`MAX_RESIZE_PIXELS`], so the resize buffer stays allocatable and the JPEG
/// encoder accepts the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDimensions {
    width: u32,
    height: u32,
}

impl TargetDimensions {
    /// Validate a requested output size.
    ///
    /// # Errors
    ///
    /// Returns `CompressError::InvalidDimensions` if either side is zero or
    /// above [`MAX_SIDE`], or if `width * height` exceeds [`MAX_RESIZE_PIXELS`].
    pub fn new(width: u32, height: u32) -> Result<Self, CompressError> {
        let sides_ok = (1..=MAX_SIDE).contains(&width) && (1..=MAX_SIDE).contains(&height);
        if !sides_ok || u64::from(width) * u64::from(height) > MAX_RESIZE_PIXELS {
            return Err(CompressError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Maximum encoded size in bytes. Always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SizeBudget(u64);

impl SizeBudget {
    /// # Errors
    ///
    /// Returns `CompressError::InvalidBudget` for zero.
    pub fn new(bytes: u64) -> Result<Self, CompressError> {
        if bytes == 0 {
            return Err(CompressError::InvalidBudget);
        }
        Ok(Self(bytes))
    }

    /// Budget of `mb` binary megabytes (`mb * 1024 * 1024` bytes).
    pub fn from_megabytes(mb: u64) -> Result<Self, CompressError> {
        mb.checked_mul(1024 * 1024)
            .ok_or(CompressError::InvalidBudget)
            .and_then(Self::new)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Whether an encode of `len` bytes fits.
    pub fn allows(&self, len: usize) -> bool {
        len as u64 <= self.0
    }
}

impl Default for SizeBudget {
    fn default() -> Self {
        Self(DEFAULT_BUDGET_BYTES)
    }
}

/// The default quality schedule bounds.
pub struct QualityLevel;

impl QualityLevel {
    pub const START: u8 = 95;
    pub const FLOOR: u8 = 10;
    pub const STEP: u8 = 5;

    /// Descending qualities tried by the default compressor.
    pub fn steps() -> impl Iterator<Item = u8> {
        (Self::FLOOR..=Self::START).rev().step_by(Self::STEP as usize)
    }
}

/// Tunables for [`compress_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressOptions {
    /// First quality tried.
    pub start: u8,
    /// Lowest quality tried; the loop stops here even if over budget.
    pub floor: u8,
    /// Decrement between attempts.
    pub step: u8,
    /// Resampling filter for the resize.
    pub filter: FilterType,
    /// Ceiling the loop compresses against.
    pub budget: SizeBudget,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            start: QualityLevel::START,
            floor: QualityLevel::FLOOR,
            step: QualityLevel::STEP,
            filter: FilterType::Lanczos3,
            budget: SizeBudget::default(),
        }
    }
}

impl CompressOptions {
    /// Default schedule against `budget`.
    pub fn with_budget(budget: SizeBudget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Check that `1 <= floor <= start <= 100` and `step > 0`.
    ///
    /// # Errors
    ///
    /// Returns `CompressError::InvalidOptions` describing the first violation.
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.step == 0 {
            return Err(CompressError::InvalidOptions("step must be non-zero".into()));
        }
        if self.floor == 0 || self.start > 100 {
            return Err(CompressError::InvalidOptions(format!(
                "qualities must lie in 1..=100 (start {}, floor {})",
                self.start, self.floor
            )));
        }
        if self.floor > self.start {
            return Err(CompressError::InvalidOptions(format!(
                "floor {} is above start {}",
                self.floor, self.start
            )));
        }
        Ok(())
    }
}

/// The JPEG chosen by the compressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// Complete JPEG stream.
    pub bytes: Vec<u8>,
    /// Quality that produced `bytes`.
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    /// Budget the artifact was compressed against.
    pub budget: SizeBudget,
    /// Number of encodes performed, including the final one.
    pub attempts: u32,
}

impl EncodedArtifact {
    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// False when the quality floor was reached without fitting the budget.
    pub fn within_budget(&self) -> bool {
        self.budget.allows(self.bytes.len())
    }

    /// Write the JPEG bytes to `out` and flush it.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        out.write_all(&self.bytes)?;
        out.flush()
    }

    /// Take the JPEG bytes, dropping the metadata.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Resize `image` to exactly `dimensions` and compress it under `budget`
/// using the default schedule (95 down to 10 in steps of 5, Lanczos3).
pub fn compress(
    image: &DecodedImage,
    dimensions: TargetDimensions,
    budget: SizeBudget,
) -> Result<EncodedArtifact, CompressError> {
    compress_with(image, dimensions, &CompressOptions::with_budget(budget))
}

/// Resize and compress with explicit options.
///
/// # Arguments
///
/// * `image` - Decoded source image, any size
/// * `dimensions` - Exact output size; aspect ratio is not preserved
/// * `options` - Quality schedule, resampling filter and byte budget
///
/// # Errors
///
/// Returns `CompressError::InvalidOptions` for an inconsistent schedule,
/// `CompressError::Resize` if the source cannot be resampled and
/// `CompressError::Encode` if any encode attempt fails. Ending over budget is
/// not an error; check [`EncodedArtifact::within_budget`].
pub fn compress_with(
    image: &DecodedImage,
    dimensions: TargetDimensions,
    options: &CompressOptions,
) -> Result<EncodedArtifact, CompressError> {
    options.validate()?;

    let resized = decode::resize(
        image,
        dimensions.width(),
        dimensions.height(),
        options.filter,
    )?;

    compress_pixels(&resized, options)
}

/// Run the quality search on an image that is already at its output size.
///
/// Encodes at `options.start`, then re-encodes at `step` lower qualities while
/// the output is over budget and the floor has not been reached.
///
/// # Errors
///
/// Returns `CompressError::InvalidOptions` or `CompressError::Encode`.
pub fn compress_pixels(
    resized: &DecodedImage,
    options: &CompressOptions,
) -> Result<EncodedArtifact, CompressError> {
    options.validate()?;

    let budget = options.budget;
    let mut quality = options.start;
    let mut bytes = encode_jpeg_image(resized, quality)?;
    let mut attempts = 1u32;
    tracing::trace!(quality, size = bytes.len(), "Encoded attempt");

    while !budget.allows(bytes.len()) && quality > options.floor {
        quality = quality.saturating_sub(options.step).max(options.floor);
        bytes = encode_jpeg_image(resized, quality)?;
        attempts += 1;
        tracing::trace!(quality, size = bytes.len(), "Encoded attempt");
    }

    let artifact = EncodedArtifact {
        bytes,
        quality,
        width: resized.width,
        height: resized.height,
        budget,
        attempts,
    };

    if artifact.within_budget() {
        tracing::debug!(
            quality,
            size = artifact.len(),
            budget = budget.bytes(),
            attempts,
            "Compressed within budget"
        );
    } else {
        tracing::warn!(
            quality,
            size = artifact.len(),
            budget = budget.bytes(),
            attempts,
            "Quality floor reached without meeting budget; keeping oversized artifact"
        );
    }

    Ok(artifact)
}

/// Compress and write the chosen JPEG to `path`.
///
/// # Errors
///
/// As [`compress`], plus `CompressError::Io` if the file cannot be written.
pub fn compress_to_path(
    image: &DecodedImage,
    dimensions: TargetDimensions,
    budget: SizeBudget,
    path: impl AsRef<Path>,
) -> Result<EncodedArtifact, CompressError> {
    let artifact = compress(image, dimensions, budget)?;
    let file = std::fs::File::create(path.as_ref())?;
    artifact.write_to(std::io::BufWriter::new(file))?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_jpeg;
    use crate::test_support::noise_pixels;

    fn noise_image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(width, height, noise_pixels(width, height))
    }

    fn flat_image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(width, height, vec![140u8; (width * height * 3) as usize])
    }

    fn dims(width: u32, height: u32) -> TargetDimensions {
        TargetDimensions::new(width, height).unwrap()
    }

    #[test]
    fn test_quality_schedule() {
        let steps: Vec<u8> = QualityLevel::steps().collect();
        assert_eq!(steps.first(), Some(&95));
        assert_eq!(steps.last(), Some(&10));
        assert_eq!(steps.len(), 18);
        assert!(steps.windows(2).all(|w| w[0] - w[1] == 5));
    }

    #[test]
    fn test_default_budget_is_three_megabytes() {
        assert_eq!(SizeBudget::default().bytes(), 3_145_728);
        assert_eq!(SizeBudget::from_megabytes(3).unwrap(), SizeBudget::default());
    }

    #[test]
    fn test_zero_budget_rejected() {
        assert!(matches!(SizeBudget::new(0), Err(CompressError::InvalidBudget)));
        assert!(matches!(
            SizeBudget::from_megabytes(0),
            Err(CompressError::InvalidBudget)
        ));
        assert!(SizeBudget::from_megabytes(u64::MAX).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            TargetDimensions::new(0, 10),
            Err(CompressError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(TargetDimensions::new(10, 0).is_err());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert!(matches!(
            TargetDimensions::new(u32::MAX, u32::MAX),
            Err(CompressError::InvalidDimensions { .. })
        ));
        assert!(TargetDimensions::new(70_000, 1).is_err());
        assert!(TargetDimensions::new(1, MAX_SIDE + 1).is_err());
        // Each side is legal, the area is not.
        assert!(TargetDimensions::new(MAX_SIDE, MAX_SIDE).is_err());

        assert!(TargetDimensions::new(MAX_SIDE, 1).is_ok());
        assert!(TargetDimensions::new(8192, 8192).is_ok());
    }

    #[test]
    fn test_fits_at_first_attempt() {
        let artifact = compress(&flat_image(120, 90), dims(80, 60), SizeBudget::default()).unwrap();

        assert_eq!(artifact.quality, 95);
        assert_eq!(artifact.attempts, 1);
        assert!(artifact.within_budget());
        assert_eq!((artifact.width, artifact.height), (80, 60));
    }

    #[test]
    fn test_output_has_requested_dimensions() {
        let artifact = compress(&noise_image(64, 48), dims(33, 71), SizeBudget::default()).unwrap();

        let decoded = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 71));
    }

    #[test]
    fn test_picks_highest_quality_meeting_budget() {
        let img = noise_image(96, 96);
        let sizes: Vec<(u8, usize)> = QualityLevel::steps()
            .map(|q| (q, encode_jpeg(&img.pixels, 96, 96, q).unwrap().len()))
            .collect();

        // Budget sits exactly at the size of the 60-quality encode.
        let (_, target) = sizes.iter().find(|(q, _)| *q == 60).copied().unwrap();
        let expected = sizes
            .iter()
            .find(|(_, len)| *len <= target)
            .map(|(q, _)| *q)
            .unwrap();

        let budget = SizeBudget::new(target as u64).unwrap();
        let artifact = compress(&img, dims(96, 96), budget).unwrap();

        assert_eq!(artifact.quality, expected);
        assert!(artifact.within_budget());
        assert_eq!(artifact.attempts as usize, ((95 - expected) / 5) as usize + 1);
    }

    #[test]
    fn test_budget_unmet_returns_floor_artifact() {
        let img = noise_image(64, 64);
        let budget = SizeBudget::new(1).unwrap();

        let artifact = compress(&img, dims(64, 64), budget).unwrap();

        assert_eq!(artifact.quality, 10);
        assert_eq!(artifact.attempts, 18);
        assert!(!artifact.within_budget());
        assert_eq!(
            artifact.bytes,
            encode_jpeg(&img.pixels, 64, 64, 10).unwrap()
        );
    }

    #[test]
    fn test_compress_is_deterministic() {
        let img = noise_image(50, 40);
        let budget = SizeBudget::new(2_000).unwrap();

        let a = compress(&img, dims(25, 20), budget).unwrap();
        let b = compress(&img, dims(25, 20), budget).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_schedule_respects_floor() {
        let options = CompressOptions {
            start: 90,
            floor: 42,
            step: 20,
            filter: FilterType::Bilinear,
            budget: SizeBudget::new(1).unwrap(),
        };

        let artifact = compress_with(&noise_image(32, 32), dims(32, 32), &options).unwrap();
        // 90 -> 70 -> 50 -> 42
        assert_eq!(artifact.quality, 42);
        assert_eq!(artifact.attempts, 4);
    }

    #[test]
    fn test_invalid_options() {
        let mut options = CompressOptions::default();
        options.step = 0;
        assert!(matches!(options.validate(), Err(CompressError::InvalidOptions(_))));

        let mut options = CompressOptions::default();
        options.floor = 96;
        assert!(options.validate().is_err());

        let mut options = CompressOptions::default();
        options.start = 101;
        assert!(options.validate().is_err());

        let mut options = CompressOptions::default();
        options.floor = 0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_compress_to_path_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");

        let artifact =
            compress_to_path(&noise_image(40, 30), dims(20, 15), SizeBudget::default(), &path)
                .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, artifact.bytes);
    }

    #[test]
    fn test_compress_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.jpg");

        let result = compress_to_path(&flat_image(8, 8), dims(8, 8), SizeBudget::default(), path);
        assert!(matches!(result, Err(CompressError::Io(_))));
    }
}
