//! Raster decoding for ingestion, history snapshots and fragments.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, Orientation, Raster};

/// Decode an image of any supported format, applying EXIF orientation.
///
/// This is the ingestion path: the result becomes the base raster, so it is
/// always converted to RGBA8 regardless of the source color type.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` if the bytes cannot be decoded.
pub fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = read_dynamic(bytes, None)?;
    let oriented = apply_orientation(img, orientation);
    Ok(Raster::from_rgba_image(oriented.into_rgba8()))
}

/// Decode a PNG produced by [`crate::encode::encode_png`].
///
/// Snapshots and fragments are always PNG, so the format is not guessed.
pub fn decode_png(bytes: &[u8]) -> Result<Raster, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let img = read_dynamic(bytes, Some(ImageFormat::Png))?;
    Ok(Raster::from_rgba_image(img.into_rgba8()))
}

fn read_dynamic(bytes: &[u8], format: Option<ImageFormat>) -> Result<DynamicImage, DecodeError> {
    let cursor = Cursor::new(bytes);
    let reader = match format {
        Some(format) => ImageReader::with_format(cursor, format),
        None => ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?,
    };

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// EXIF orientation of `bytes`, `Orientation::Normal` when there is none.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
