//! Exact-size resampling.
//!
//! Output always has the requested width and height. Aspect ratio is not
//! preserved; a 4:3 scan asked to become 100x100 is stretched.

use super::{DecodeError, DecodedImage, FilterType};

/// Area cap for the output and for the intermediate pass of a resize.
///
/// The separable filter first builds a `source_width x height` buffer of
/// `f32` samples, so both that and the output are bounded here. 8192 x 8192.
pub const MAX_RESIZE_PIXELS: u64 = 8192 * 8192;

/// Resample `image` to exactly `width` x `height`.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidDimensions`] when either side is zero,
/// [`DecodeError::TooLarge`] when the output or the intermediate buffer would
/// exceed [`MAX_RESIZE_PIXELS`], and [`DecodeError::CorruptedFile`] when the
/// pixel buffer disagrees with the image's declared size.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    let output = u64::from(width) * u64::from(height);
    let intermediate = u64::from(image.width) * u64::from(height);
    if output.max(intermediate) > MAX_RESIZE_PIXELS {
        return Err(DecodeError::TooLarge(format!(
            "resizing {}x{} to {width}x{height} needs more than {MAX_RESIZE_PIXELS} pixels",
            image.width, image.height
        )));
    }

    let Some(source) = image.as_rgb_view() else {
        return Err(DecodeError::CorruptedFile(format!(
            "expected {} pixel bytes for {}x{}, found {}",
            image.width as usize * image.height as usize * 3,
            image.width,
            image.height,
            image.byte_size()
        )));
    };

    if (image.width, image.height) == (width, height) {
        return Ok(image.clone());
    }

    tracing::trace!(
        from_width = image.width,
        from_height = image.height,
        width,
        height,
        ?filter,
        "Resampling"
    );
    let out = image::imageops::resize(&source, width, height, filter.to_image_filter());
    Ok(DecodedImage::from_rgb_image(out))
}
