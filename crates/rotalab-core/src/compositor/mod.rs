//! The compositor: sole owner of the base raster.
//!
//! Every write to the base raster goes through here: loading, clearing a
//! lifted region, committing a fragment and restoring a snapshot. Rendering
//! never mutates the base; it produces a separate frame with the overlay
//! (live selection or pending fragment) drawn on top.

mod blend;
mod stroke;

pub use blend::{draw_raster, fill_rect, source_over};
pub use stroke::stroke_dashed_rect;

use crate::config::OverlayStyle;
use crate::decode::Raster;
use crate::encode::{encode_png, encode_raster, ExportFormat};
use crate::error::EngineError;
use crate::fragment::RotatedFragment;
use crate::geometry::{PixelRect, Point, Rect};

/// What to draw over the base raster in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay<'a> {
    None,
    /// Dashed outline plus translucent fill.
    Selection(Rect),
    /// Translucent fragment plus its own dashed outline.
    Fragment(&'a RotatedFragment),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compositor {
    base: Option<Raster>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly ingested raster as the base surface.
    pub fn load(&mut self, raster: Raster) {
        self.base = Some(raster);
    }

    pub fn unload(&mut self) {
        self.base = None;
    }

    pub fn base(&self) -> Option<&Raster> {
        self.base.as_ref()
    }

    pub fn surface(&self) -> Result<&Raster, EngineError> {
        self.base.as_ref().ok_or(EngineError::MissingSurface)
    }

    fn surface_mut(&mut self) -> Result<&mut Raster, EngineError> {
        self.base.as_mut().ok_or(EngineError::MissingSurface)
    }

    /// Make `region` fully transparent.
    pub fn clear_region(&mut self, region: PixelRect) -> Result<(), EngineError> {
        let base = self.surface_mut()?;
        let right = region.right().min(base.width);
        let bottom = region.bottom().min(base.height);
        for y in region.y..bottom {
            for x in region.x..right {
                base.set_pixel(x, y, [0, 0, 0, 0]);
            }
        }
        Ok(())
    }

    /// Draw decoded fragment pixels permanently at `at`, snapped to whole pixels.
    pub fn commit_fragment(&mut self, pixels: &Raster, at: Point) -> Result<(), EngineError> {
        let base = self.surface_mut()?;
        draw_raster(base, pixels, at.x.round() as i64, at.y.round() as i64, 1.0);
        Ok(())
    }

    /// Replace the base with a restored snapshot.
    pub fn restore(&mut self, raster: Raster) {
        self.base = Some(raster);
    }

    /// Encode the current base for the undo history.
    pub fn snapshot(&self) -> Result<Vec<u8>, EngineError> {
        Ok(encode_png(self.surface()?)?)
    }

    /// Encode the current base as a portable image.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        Ok(encode_raster(self.surface()?, format)?)
    }

    /// Produce a display frame: the base with `overlay` drawn on top.
    pub fn render(&self, overlay: Overlay<'_>, style: &OverlayStyle) -> Result<Raster, EngineError> {
        let mut frame = self.surface()?.clone();
        let stroke = style.stroke_color.to_array();

        match overlay {
            Overlay::None => {}
            Overlay::Selection(rect) => {
                let edges = snap(&rect);
                stroke_dashed_rect(&mut frame, edges, style.stroke_width, style.dash, stroke);
                let (x0, y0, x1, y1) = edges;
                fill_rect(&mut frame, x0, y0, x1, y1, style.selection_fill.to_array());
            }
            Overlay::Fragment(fragment) => {
                let bounds = fragment.bounds();
                let edges = snap(&bounds);
                draw_raster(
                    &mut frame,
                    fragment.preview(),
                    edges.0,
                    edges.1,
                    style.fragment_opacity,
                );
                stroke_dashed_rect(&mut frame, edges, style.stroke_width, style.dash, stroke);
            }
        }

        Ok(frame)
    }
}

/// Round a rectangle to pixel edges `(x0, y0, x1, y1)`.
fn snap(rect: &Rect) -> (i64, i64, i64, i64) {
    (
        rect.x.round() as i64,
        rect.y.round() as i64,
        (rect.x + rect.width).round() as i64,
        (rect.y + rect.height).round() as i64,
    )
}
