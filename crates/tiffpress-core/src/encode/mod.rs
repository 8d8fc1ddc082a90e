//! Image encoding for tiffpress.
//!
//! Only baseline JPEG is produced. The size-capped search over quality levels
//! lives in [`crate::compress`]; this module encodes exactly once per call.

mod jpeg;

pub use jpeg::{encode_jpeg, encode_jpeg_image, EncodeError};
