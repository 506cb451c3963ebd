//! The editing engine exposed to JavaScript.
//!
//! [`RotaLab`] wraps a core `Engine`. The page forwards pointer events in
//! client coordinates, calls [`RotaLab::render`] whenever
//! [`RotaLab::take_redraw`] reports a change, and drains events to show
//! notifications.
//!
//! # Example
//!
//! ```typescript
//! import { RotaLab } from '@rotalab/wasm';
//!
//! const lab = new RotaLab({ selectionThreshold: 10 });
//! lab.load_image(new Uint8Array(await file.arrayBuffer()));
//!
//! canvas.onpointerdown = (e) => lab.pointer_down(e.clientX, e.clientY);
//! canvas.onpointermove = (e) => lab.pointer_move(e.clientX, e.clientY);
//! canvas.onpointerup = (e) => lab.pointer_up(e.clientX, e.clientY);
//! canvas.onpointerleave = () => lab.pointer_leave();
//!
//! lab.set_rotation(90);
//! lab.apply_rotation();
//! const request = lab.request_commit();
//! await Promise.resolve();
//! lab.complete_decode(request); // "applied" or "stale"
//!
//! for (const event of lab.drain_events()) toast(event.kind);
//! ```

use std::fmt::Display;

use rotalab_core::clock::Clock;
use rotalab_core::{
    CanvasLayout, DecodeRequest, DecodeStatus, Engine, EngineConfig, ExportFormat, Point, Raster,
    ToolMode,
};
use wasm_bindgen::prelude::*;

use crate::types::JsRaster;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Timestamps from `Date.now()`; `SystemTime` is unavailable in the browser.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
struct JsClock;

#[cfg(target_arch = "wasm32")]
impl Clock for JsClock {
    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

fn platform_clock() -> Box<dyn Clock> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(JsClock)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(rotalab_core::SystemClock)
    }
}

/// A pending fragment decode. Hand it back to `complete_decode`.
#[wasm_bindgen]
pub struct JsDecodeRequest {
    inner: DecodeRequest,
}

#[wasm_bindgen]
impl JsDecodeRequest {
    /// PNG bytes of the fragment, for decoding on the JS side.
    pub fn image_data(&self) -> Vec<u8> {
        self.inner.image_data().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.inner.generation() as f64
    }
}

fn status_str(status: DecodeStatus) -> String {
    match status {
        DecodeStatus::Applied => "applied",
        DecodeStatus::Stale => "stale",
    }
    .to_string()
}

#[wasm_bindgen]
pub struct RotaLab {
    engine: Engine,
}

#[wasm_bindgen]
impl RotaLab {
    /// Create an editor. `config` is an optional `EngineConfig`-shaped
    /// object; missing keys take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RotaLab, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_err)?
        };
        Self::with_config(config).map_err(js_err)
    }

    // ------------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------------

    /// Load PNG or JPEG bytes. Clears selection, fragment and history.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.engine.load_image_bytes(bytes).map_err(js_err)
    }

    /// Load raw RGBA pixels, for example from `getImageData()`.
    pub fn load_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> Result<(), JsValue> {
        let raster = Raster::from_rgba(width, height, pixels).map_err(js_err)?;
        self.engine.load_image(raster).map_err(js_err)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.engine.has_image()
    }

    // ------------------------------------------------------------------------
    // Pointer input (client coordinates)
    // ------------------------------------------------------------------------

    /// Report the canvas geometry: `getBoundingClientRect()` plus the
    /// backing-store size.
    pub fn set_layout(
        &mut self,
        left: f64,
        top: f64,
        rendered_width: f64,
        rendered_height: f64,
        backing_width: u32,
        backing_height: u32,
    ) {
        self.engine.set_layout(CanvasLayout {
            left,
            top,
            rendered_width,
            rendered_height,
            backing_width,
            backing_height,
        });
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.engine.pointer_down(Point::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.engine.pointer_move(Point::new(x, y))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.engine.pointer_up(Point::new(x, y))
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.engine.pointer_leave()
    }

    // ------------------------------------------------------------------------
    // Tool mode and rotation
    // ------------------------------------------------------------------------

    /// "select", "rotate" or "place"
    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.engine.tool().to_string()
    }

    /// Returns false when the switch is not allowed right now. Errors only
    /// on an unknown mode name.
    pub fn set_tool(&mut self, mode: &str) -> Result<bool, JsValue> {
        let mode: ToolMode = mode.parse().map_err(js_err)?;
        Ok(self.engine.set_tool(mode))
    }

    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> i32 {
        self.engine.rotation()
    }

    /// Set the angle for the next extraction. Returns the clamped value.
    pub fn set_rotation(&mut self, degrees: i32) -> Result<i32, JsValue> {
        self.engine.set_rotation(degrees).map_err(js_err)
    }

    /// Current selection as `{ x, y, width, height }`, or undefined.
    pub fn selection(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.selection()).map_err(js_err)
    }

    /// Rounded selection size as `[width, height]`, or undefined.
    pub fn selection_size(&self) -> Option<Vec<u32>> {
        self.engine.selection_size().map(|(w, h)| vec![w, h])
    }

    /// Pending fragment as `{ id, x, y, width, height, rotationDegrees }`, or undefined.
    pub fn fragment(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.fragment()).map_err(js_err)
    }

    /// PNG bytes of the pending fragment.
    pub fn fragment_image_data(&self) -> Option<Vec<u8>> {
        self.engine.fragment().map(|f| f.image_data.clone())
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Lift the selection into a rotated fragment. Returns the fragment id.
    pub fn apply_rotation(&mut self) -> Result<f64, JsValue> {
        self.engine
            .apply_rotation()
            .map(|id| id as f64)
            .map_err(js_err)
    }

    /// Start a commit. Resolve it with `complete_decode` or
    /// `complete_decode_with`.
    pub fn request_commit(&mut self) -> Result<JsDecodeRequest, JsValue> {
        self.engine
            .request_commit()
            .map(|inner| JsDecodeRequest { inner })
            .map_err(js_err)
    }

    /// Decode the request's pixels here and apply them if still current.
    /// Returns "applied" or "stale".
    pub fn complete_decode(&mut self, request: JsDecodeRequest) -> Result<String, JsValue> {
        self.engine
            .complete_decode(request.inner.run())
            .map(status_str)
            .map_err(js_err)
    }

    /// Apply pixels the page decoded itself from `request.image_data()`.
    pub fn complete_decode_with(
        &mut self,
        request: JsDecodeRequest,
        image: &JsRaster,
    ) -> Result<String, JsValue> {
        let outcome = request.inner.resolve(image.to_raster());
        self.engine
            .complete_decode(outcome)
            .map(status_str)
            .map_err(js_err)
    }

    /// Commit the pending fragment synchronously.
    pub fn commit(&mut self) -> Result<(), JsValue> {
        self.engine.commit().map_err(js_err)
    }

    /// Rotate the selection and commit it where it was.
    pub fn apply_rotation_in_place(&mut self) -> Result<(), JsValue> {
        self.engine.apply_rotation_in_place().map_err(js_err)
    }

    pub fn cancel(&mut self) {
        self.engine.cancel();
    }

    pub fn undo(&mut self) -> Result<(), JsValue> {
        self.engine.undo().map_err(js_err)
    }

    #[wasm_bindgen(getter)]
    pub fn history_len(&self) -> usize {
        self.engine.history_len()
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Encode the base raster in the configured format.
    pub fn export(&self) -> Result<Vec<u8>, JsValue> {
        self.engine.export().map_err(js_err)
    }

    /// Encode the base raster as JPEG, whatever the configured format.
    pub fn export_jpeg(&self, quality: u8) -> Result<Vec<u8>, JsValue> {
        self.engine
            .export_as(ExportFormat::Jpeg { quality })
            .map_err(js_err)
    }

    #[wasm_bindgen(getter)]
    pub fn export_mime_type(&self) -> String {
        self.engine.config().export_format.mime_type().to_string()
    }

    /// `rotated-image-<timestamp>.<ext>`
    pub fn export_file_name(&self) -> String {
        self.engine.export_file_name()
    }

    /// Base raster plus overlay, ready for `putImageData`.
    pub fn render(&self) -> Result<JsRaster, JsValue> {
        self.engine
            .render_frame()
            .map(JsRaster::from_raster)
            .map_err(js_err)
    }

    /// Whether a redraw is due. Clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        self.engine.take_redraw()
    }

    /// Queued events as `[{ kind: "selection-ready", ... }, ...]`.
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let events = self.engine.drain_events();
        serde_wasm_bindgen::to_value(&events).map_err(js_err)
    }
}

impl RotaLab {
    /// Rust-side constructor, also used by native tests.
    pub(crate) fn with_config(
        config: EngineConfig,
    ) -> Result<Self, rotalab_core::ConfigError> {
        Ok(Self {
            engine: Engine::with_clock(config, platform_clock())?,
        })
    }
}

/// Tests for the editor bindings.
///
/// Error paths build a `JsValue` and only work on wasm32, so the native tests
/// stick to calls that succeed.
#[cfg(test)]
mod tests {
    use super::*;

    fn lab_with_image() -> RotaLab {
        let mut lab = RotaLab::with_config(EngineConfig::default()).unwrap();
        let pixels = (0..200 * 200)
            .flat_map(|i| [(i % 200) as u8, (i / 200) as u8, 90, 255])
            .collect();
        lab.load_pixels(200, 200, pixels).unwrap();
        lab
    }

    #[test]
    fn test_select_rotate_commit_undo() {
        let mut lab = lab_with_image();
        let before = lab.render().unwrap().pixels();

        lab.pointer_down(50.0, 50.0);
        lab.pointer_move(90.0, 90.0);
        lab.pointer_up(90.0, 90.0);
        assert_eq!(lab.tool(), "rotate");
        assert_eq!(lab.selection_size(), Some(vec![40, 40]));

        assert_eq!(lab.set_rotation(90).unwrap(), 90);
        assert_eq!(lab.apply_rotation().unwrap(), 1.0);
        assert_eq!(lab.tool(), "place");
        assert!(lab.fragment_image_data().is_some());

        let request = lab.request_commit().unwrap();
        assert_eq!(lab.complete_decode(request).unwrap(), "applied");
        assert_eq!(lab.tool(), "select");
        assert_eq!(lab.history_len(), 1);

        lab.undo().unwrap();
        assert!(!lab.can_undo());
        assert_eq!(lab.render().unwrap().pixels(), before);
    }

    #[test]
    fn test_cancel_makes_request_stale() {
        let mut lab = lab_with_image();
        lab.pointer_down(20.0, 20.0);
        lab.pointer_up(60.0, 60.0);
        lab.apply_rotation().unwrap();

        let request = lab.request_commit().unwrap();
        lab.cancel();
        assert_eq!(lab.complete_decode(request).unwrap(), "stale");
    }

    #[test]
    fn test_complete_decode_with_page_pixels() {
        let mut lab = lab_with_image();
        lab.pointer_down(20.0, 20.0);
        lab.pointer_up(60.0, 60.0);
        lab.apply_rotation().unwrap();

        let request = lab.request_commit().unwrap();
        let decoded =
            JsRaster::from_raster(rotalab_core::decode::decode_png(&request.image_data()).unwrap());
        assert_eq!(
            lab.complete_decode_with(request, &decoded).unwrap(),
            "applied"
        );
    }

    #[test]
    fn test_set_tool_by_name() {
        let mut lab = lab_with_image();
        assert!(!lab.set_tool("rotate").unwrap());
        assert!(lab.set_tool("select").unwrap());
    }

    #[test]
    fn test_layout_maps_client_coordinates() {
        let mut lab = lab_with_image();
        lab.set_layout(100.0, 50.0, 400.0, 400.0, 200, 200);
        lab.pointer_down(200.0, 150.0);
        lab.pointer_up(280.0, 230.0);
        assert_eq!(lab.selection_size(), Some(vec![40, 40]));
    }

    #[test]
    fn test_export() {
        let lab = lab_with_image();
        let png = lab.export().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(lab.export_mime_type(), "image/png");
        assert!(lab.export_file_name().starts_with("rotated-image-"));
        assert!(lab.export_file_name().ends_with(".png"));
        let jpeg = lab.export_jpeg(85).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_redraw_flag() {
        let mut lab = lab_with_image();
        assert!(lab.take_redraw());
        assert!(!lab.take_redraw());
        lab.pointer_down(5.0, 5.0);
        assert!(lab.take_redraw());
    }
}
