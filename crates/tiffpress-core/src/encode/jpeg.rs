//! Baseline JPEG encoding through the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur while encoding a JPEG.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel buffer length is not `width * height * 3`.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed, e.g. a side longer than 65535 pixels.
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGB pixel data as a baseline JPEG.
///
/// # Arguments
///
/// * `pixels` - RGB8 samples, row-major, 3 bytes per pixel
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1..=100
///
/// # Returns
///
/// The complete JPEG stream. Identical input always yields identical bytes.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for a zero side,
/// `EncodeError::InvalidPixelData` for a buffer of the wrong length and
/// `EncodeError::EncodingFailed` if the encoder rejects the image.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);

    let mut buffer = Cursor::new(Vec::with_capacity(expected / 8));
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a decoded image at the given quality.
///
/// # Errors
///
/// As [`encode_jpeg`].
pub fn encode_jpeg_image(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg(&image.pixels, image.width, image.height, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noise_pixels;

    fn assert_jpeg_markers(bytes: &[u8]) {
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8], "missing SOI");
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9], "missing EOI");
    }

    #[test]
    fn test_encode_jpeg_basic() {
        let pixels = vec![90u8; 64 * 48 * 3];
        let jpeg = encode_jpeg(&pixels, 64, 48, 95).unwrap();
        assert_jpeg_markers(&jpeg);
    }

    #[test]
    fn test_encode_roundtrip_dimensions() {
        let pixels = noise_pixels(37, 21);
        let jpeg = encode_jpeg(&pixels, 37, 21, 80).unwrap();

        let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 21));
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_lower_quality_is_smaller_on_noise() {
        let pixels = noise_pixels(96, 96);
        let high = encode_jpeg(&pixels, 96, 96, 95).unwrap();
        let low = encode_jpeg(&pixels, 96, 96, 10).unwrap();
        assert!(low.len() < high.len(), "low={} high={}", low.len(), high.len());
    }

    #[test]
    fn test_quality_is_clamped() {
        let pixels = vec![128u8; 8 * 8 * 3];
        assert!(encode_jpeg(&pixels, 8, 8, 0).is_ok());
        assert!(encode_jpeg(&pixels, 8, 8, 255).is_ok());
    }

    #[test]
    fn test_pixel_length_mismatch() {
        let pixels = vec![0u8; 10 * 10 * 3 - 1];
        assert!(matches!(
            encode_jpeg(&pixels, 10, 10, 90),
            Err(EncodeError::InvalidPixelData {
                expected: 300,
                actual: 299
            })
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        assert!(matches!(
            encode_jpeg(&[], 0, 10, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_jpeg(&[], 10, 0, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_decoded_image() {
        let img = DecodedImage::new(3, 2, vec![255u8; 18]);
        let jpeg = encode_jpeg_image(&img, 50).unwrap();
        assert_jpeg_markers(&jpeg);
    }
}
