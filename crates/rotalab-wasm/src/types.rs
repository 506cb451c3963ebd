//! WASM-compatible wrapper types for raster data.
//!
//! This module provides JavaScript-friendly types that wrap the core RotaLab types,
//! handling the conversion between Rust and JavaScript data representations.

use rotalab_core::Raster;
use wasm_bindgen::prelude::*;

/// An RGBA raster wrapper for JavaScript.
///
/// The layout matches `ImageData`: 4 bytes per pixel, straight alpha,
/// row-major. `new ImageData(new Uint8ClampedArray(r.pixels()), r.width)`
/// puts it on a canvas.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRaster {
    /// Create a new JsRaster from dimensions and RGBA pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRaster {
        JsRaster {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array. This is a copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {}
}

impl JsRaster {
    pub(crate) fn from_raster(raster: Raster) -> Self {
        Self {
            width: raster.width,
            height: raster.height,
            pixels: raster.pixels,
        }
    }

    /// Validate and convert to a core Raster. Clones the pixel data.
    pub(crate) fn to_raster(&self) -> Result<Raster, rotalab_core::DecodeError> {
        Raster::from_rgba(self.width, self.height, self.pixels.clone())
    }
}
