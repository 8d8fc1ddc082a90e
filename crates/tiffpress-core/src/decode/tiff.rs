//! TIFF decoding into an 8-bit RGB raster.
//!
//! Whatever the source layout (grayscale, RGBA, 16-bit, float), the result is
//! always three 8-bit channels. Alpha is dropped, not composited.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage};

/// Decode TIFF bytes, rejecting anything that is not a TIFF container.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes do not start with a TIFF
/// header, and `DecodeError::CorruptedFile` / `DecodeError::Unsupported` if the
/// decoder fails on the contents.
pub fn decode_tiff(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if !is_tiff(bytes) {
        return Err(DecodeError::InvalidFormat);
    }

    let img = image::load_from_memory_with_format(bytes, ImageFormat::Tiff)?;
    Ok(DecodedImage::from_rgb_image(img.into_rgb8()))
}

/// Decode image bytes whose format is sniffed from the content.
///
/// TIFF headers go straight to [`decode_tiff`]. Anything else falls back to
/// the `image` crate's signature detection: uploads are accepted by file
/// extension, so a `.tif` that actually holds a JPEG still converts. Only the
/// formats compiled into the `image` crate are recognised.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` when no known signature matches, and
/// the decoder's error otherwise.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if is_tiff(bytes) {
        return decode_tiff(bytes);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    tracing::debug!(format = ?reader.format(), "Upload is not a TIFF; decoding sniffed format");
    let img = reader.decode()?;
    Ok(DecodedImage::from_rgb_image(img.into_rgb8()))
}

/// Check for a classic or BigTIFF header in either byte order.
pub fn is_tiff(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([0x49, 0x49, 0x2A, 0x00])
            | Some([0x4D, 0x4D, 0x00, 0x2A])
            | Some([0x49, 0x49, 0x2B, 0x00])
            | Some([0x4D, 0x4D, 0x00, 0x2B])
    )
}
