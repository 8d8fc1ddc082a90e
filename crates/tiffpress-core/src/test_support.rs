//! Fixture builders shared by the unit tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Encode an image as an uncompressed TIFF.
pub(crate) fn tiff_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Tiff)
        .expect("TIFF encoding of a test fixture failed");
    out.into_inner()
}

/// Smooth RGBA gradient with a varying alpha channel.
pub(crate) fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
            ((x + y) % 256) as u8,
        ])
    })
}

/// RGB TIFF bytes of a gradient image.
pub(crate) fn gradient_tiff(width: u32, height: u32) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(gradient_rgba(width, height)).to_rgb8();
    tiff_bytes(&DynamicImage::ImageRgb8(rgb))
}

/// High-entropy pixels that compress poorly, for pushing the quality loop down.
/// Seeded, so every run sees the same image.
pub(crate) fn noise_pixels(width: u32, height: u32) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x2545_F491);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    rng.fill(pixels.as_mut_slice());
    pixels
}
