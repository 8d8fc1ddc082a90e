use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an upload could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No known image signature at the start of the data.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// Recognised container, but a compression scheme, sample layout or bit
    /// depth the decoder does not handle.
    #[error("Unsupported image contents: {0}")]
    Unsupported(String),

    /// The decoder failed part way through: truncated strips, bad offsets,
    /// checksum or compression errors.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Decoding or resizing would exceed the allocation limits.
    #[error("Image too large to decode: {0}")]
    TooLarge(String),

    /// A resize target with a zero side.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        use image::error::{ImageError, LimitErrorKind};

        match err {
            ImageError::Unsupported(e) => DecodeError::Unsupported(e.to_string()),
            ImageError::Limits(e) => {
                let too_big = matches!(
                    e.kind(),
                    LimitErrorKind::InsufficientMemory | LimitErrorKind::DimensionError
                );
                if too_big {
                    DecodeError::TooLarge(e.to_string())
                } else {
                    DecodeError::Unsupported(e.to_string())
                }
            }
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

/// Resampling filter used when resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbour. Fastest; blocky on downscale.
    Nearest,
    /// Triangle filter in `image` terms.
    Bilinear,
    /// Windowed sinc over 3 lobes. Sharpest of the three and the slowest.
    #[default]
    Lanczos3,
}

impl FilterType {
    /// The equivalent `image::imageops` filter.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType as Image;

        match self {
            FilterType::Nearest => Image::Nearest,
            FilterType::Bilinear => Image::Triangle,
            FilterType::Lanczos3 => Image::Lanczos3,
        }
    }
}

/// 8-bit RGB raster, row-major, 3 bytes per pixel, no alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap an RGB8 buffer. Debug builds assert its length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "RGB buffer length does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Take ownership of an `image::RgbImage` without copying.
    pub fn from_rgb_image(rgb: image::RgbImage) -> Self {
        Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.into_raw(),
        }
    }

    /// Borrowed `image` view over the pixels, or `None` if the buffer is the
    /// wrong length for the declared size.
    pub fn as_rgb_view(&self) -> Option<image::ImageBuffer<image::Rgb<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }

    /// Length of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops::FilterType as Image;

    #[test]
    fn test_filter_mapping() {
        assert_eq!(FilterType::Nearest.to_image_filter(), Image::Nearest);
        assert_eq!(FilterType::Bilinear.to_image_filter(), Image::Triangle);
        assert_eq!(FilterType::Lanczos3.to_image_filter(), Image::Lanczos3);
        assert_eq!(FilterType::default(), FilterType::Lanczos3);
    }

    #[test]
    fn test_from_rgb_image_keeps_layout() {
        let rgb = image::RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let img = DecodedImage::from_rgb_image(rgb);

        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.byte_size(), 18);
        assert_eq!(&img.pixels[..6], &[0, 0, 7, 1, 0, 7]);
        assert_eq!(&img.pixels[9..12], &[0, 1, 7]);
    }

    #[test]
    fn test_rgb_view_requires_matching_buffer() {
        let img = DecodedImage::new(2, 1, vec![255, 0, 0, 0, 0, 255]);
        let view = img.as_rgb_view().unwrap();
        assert_eq!(view.get_pixel(1, 0).0, [0, 0, 255]);

        let short = DecodedImage {
            width: 2,
            height: 2,
            pixels: vec![0; 6],
        };
        assert!(short.as_rgb_view().is_none());
    }

    #[test]
    fn test_limit_errors_map_to_too_large() {
        use image::error::{LimitError, LimitErrorKind};

        let err: DecodeError =
            image::ImageError::Limits(LimitError::from_kind(LimitErrorKind::InsufficientMemory))
                .into();
        assert!(matches!(err, DecodeError::TooLarge(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DecodeError::CorruptedFile("truncated strip".into()).to_string(),
            "Corrupted or incomplete image file: truncated strip"
        );
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
    }
}
