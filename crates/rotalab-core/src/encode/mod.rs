//! Raster encoding for RotaLab.
//!
//! This module provides functionality for:
//! - Encoding rasters to lossless PNG (history snapshots, fragment buffers, export)
//! - Encoding rasters to JPEG with configurable quality (export only)
//!
//! # Examples
//!
//! ```ignore
//! use rotalab_core::encode::encode_png;
//!
//! let raster = rotalab_core::Raster::transparent(100, 100);
//! let png_bytes = encode_png(&raster).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod jpeg;
mod png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::Raster;

pub use jpeg::encode_jpeg;
pub use png::encode_png;

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Portable output format for exported rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExportFormat {
    /// Lossless PNG, alpha preserved.
    #[default]
    Png,
    /// JPEG at the given quality (1-100). Transparent areas become white.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }

    /// MIME type for download handlers.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encode a raster in the requested export format.
pub fn encode_raster(raster: &Raster, format: ExportFormat) -> Result<Vec<u8>, EncodeError> {
    match format {
        ExportFormat::Png => encode_png(raster),
        ExportFormat::Jpeg { quality } => encode_jpeg(raster, quality),
    }
}

/// Shared validation for both encoders.
fn validate(raster: &Raster) -> Result<(), EncodeError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }

    let expected = (raster.width as usize) * (raster.height as usize) * 4;
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }
    Ok(())
}
