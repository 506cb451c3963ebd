//! RotaLab WASM - WebAssembly bindings for RotaLab
//!
//! This crate provides WASM bindings to expose the rotalab-core editing engine
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `editor` - The `RotaLab` editor: pointer input, rotation, placement, undo
//! - `types` - WASM-compatible wrapper types for raster data
//! - `decode` - Image decoding bindings (PNG, JPEG with EXIF orientation)
//! - `logging` - Routes engine logs to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { RotaLab, init_logging } from '@rotalab/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//! init_logging('info');
//!
//! const lab = new RotaLab();
//! lab.load_image(new Uint8Array(await file.arrayBuffer()));
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod editor;
mod logging;
mod types;

// Re-export public types
pub use decode::{decode_image, decode_png};
pub use editor::{JsDecodeRequest, RotaLab};
pub use logging::init_logging;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    log::debug!("rotalab-wasm {} loaded", rotalab_core::VERSION);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
