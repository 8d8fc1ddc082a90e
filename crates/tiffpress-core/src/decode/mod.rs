//! Image decoding pipeline for tiffpress.
//!
//! This module provides functionality for:
//! - Decoding TIFF uploads (and anything else the `image` crate recognises)
//! - Flattening every source layout to 8-bit RGB
//! - Resizing to exact output dimensions
//!
//! # Examples
//!
//! ```ignore
//! use tiffpress_core::decode::{decode_tiff, resize, FilterType};
//!
//! let bytes = std::fs::read("scan.tif").unwrap();
//! let image = decode_tiff(&bytes).unwrap();
//! let small = resize(&image, 800, 600, FilterType::Lanczos3).unwrap();
//! ```

mod resize;
mod tiff;
mod types;

pub use resize::{resize, MAX_RESIZE_PIXELS};
pub use tiff::{decode_image, decode_tiff, is_tiff};
pub use types::{DecodeError, DecodedImage, FilterType};
