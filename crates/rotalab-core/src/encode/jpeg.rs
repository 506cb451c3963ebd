//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so transparent pixels (cleared selection
//! regions, for instance) are flattened onto white before encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate, EncodeError};
use crate::decode::Raster;

/// Encode an RGBA raster to JPEG bytes.
///
/// # Arguments
///
/// * `raster` - Source raster
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for further editing
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(raster: &Raster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let quality = quality.clamp(1, 100);
    let rgb = flatten_on_white(&raster.pixels);

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(&rgb, raster.width, raster.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Composite straight-alpha RGBA over opaque white, producing RGB.
fn flatten_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            let v = (c as u32 * a + 255 * (255 - a) + 127) / 255;
            rgb.push(v as u8);
        }
    }
    rgb
}
