//! Lossless PNG encoding.
//!
//! PNG is the snapshot format for undo history and the encoded form of a
//! pending fragment, so it must round-trip pixels (including alpha) exactly.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate, EncodeError};
use crate::decode::Raster;

/// Encode an RGBA raster to PNG bytes.
///
/// # Errors
///
/// Returns an error if:
/// - The pixel data length doesn't match width * height * 4
/// - Width or height is zero
/// - Encoding fails internally
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
