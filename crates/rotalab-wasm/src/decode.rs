//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode PNG or JPEG bytes, applying EXIF orientation
//! - [`decode_png`] - Decode a PNG snapshot or fragment buffer as-is
//!
//! # Example
//!
//! ```typescript
//! import { decode_image } from '@rotalab/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(`Decoded ${image.width}x${image.height}`);
//! ```

use crate::types::JsRaster;
use rotalab_core::decode;
use wasm_bindgen::prelude::*;

/// Decode a PNG or JPEG image from bytes into RGBA.
///
/// EXIF orientation is applied so the raster is upright.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image or are corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsRaster, JsValue> {
    decode::decode_image(bytes)
        .map(JsRaster::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode PNG bytes (for example a fragment's `imageData`) without touching
/// orientation.
#[wasm_bindgen]
pub fn decode_png(bytes: &[u8]) -> Result<JsRaster, JsValue> {
    decode::decode_png(bytes)
        .map(JsRaster::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
