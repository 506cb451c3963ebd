//! Fragment extraction: lift a selection into its own rotated buffer.
//!
//! The fragment buffer is a square large enough to hold the selection at any
//! angle. Its side is `ceil(max(w, h) * scale)` with `scale >= sqrt(2)`, the
//! ratio between a rectangle's diagonal and its longest side at worst.
//! The rotation is baked into the pixels here; placement never rotates.

use serde::Serialize;

use crate::decode::Raster;
use crate::encode::encode_png;
use crate::error::EngineError;
use crate::geometry::{PixelRect, Point, Rect};
use crate::transform::{crop_region, rotate_into_square, InterpolationFilter};

/// Identifies one extraction cycle.
pub type FragmentId = u64;

/// A detached, rotated copy of a selection, pending placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotatedFragment {
    pub id: FragmentId,
    /// PNG encoding of the rotated buffer.
    #[serde(skip)]
    pub image_data: Vec<u8>,
    /// Top-left placement on the base raster. May be negative or fractional.
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
    pub rotation_degrees: i32,
    /// Decoded form of `image_data`, used for the placement preview.
    #[serde(skip)]
    preview: Raster,
}

impl RotatedFragment {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width as f64, self.height as f64)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn preview(&self) -> &Raster {
        &self.preview
    }

    /// Hit test, inclusive on all edges.
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    pub(crate) fn move_to(&mut self, top_left: Point) {
        self.x = top_left.x;
        self.y = top_left.y;
    }
}

/// Output of [`extract_fragment`]: the fragment plus the pixels it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fragment: RotatedFragment,
    /// Region of the base raster the fragment was lifted from. Clearing it is
    /// the caller's job, the extractor never mutates the base raster.
    pub source: PixelRect,
}

/// Side of the square fragment buffer for a `width` x `height` selection.
pub fn fragment_side(width: u32, height: u32, scale: f64) -> u32 {
    ((width.max(height) as f64) * scale).ceil() as u32
}

/// Lift `selection` out of `base`, rotated by `angle_degrees`.
///
/// The selection is snapped to the pixel grid and clipped to the raster.
/// The content is inset by `(S - w) / 2` (integer division) so the fragment
/// is centered on the selection; with an even margin this is exactly
/// `x = selection.x + selection.width / 2 - S / 2`.
///
/// # Errors
///
/// - `InvalidSelection` if nothing of the selection lies inside the raster
/// - `EncodeFailure` if the rotated buffer cannot be encoded
pub fn extract_fragment(
    base: &Raster,
    selection: &Rect,
    angle_degrees: i32,
    id: FragmentId,
    scale: f64,
    filter: InterpolationFilter,
) -> Result<Extraction, EngineError> {
    if base.is_empty() {
        return Err(EngineError::MissingSurface);
    }
    let source = selection
        .to_pixel_rect(base.width, base.height)
        .ok_or(EngineError::InvalidSelection)?;

    let region = crop_region(base, source);
    let side = fragment_side(source.width, source.height, scale);
    let inset_x = (side - source.width) / 2;
    let inset_y = (side - source.height) / 2;
    let pivot = Point::new(
        inset_x as f64 + source.width as f64 / 2.0,
        inset_y as f64 + source.height as f64 / 2.0,
    );

    let preview = rotate_into_square(&region, angle_degrees as f64, side, pivot, filter);
    let image_data = encode_png(&preview)?;

    log::debug!(
        "extracted fragment {id}: {}x{} at ({}, {}) -> {side}px buffer, {angle_degrees} deg",
        source.width,
        source.height,
        source.x,
        source.y
    );

    Ok(Extraction {
        fragment: RotatedFragment {
            id,
            image_data,
            x: source.x as f64 - inset_x as f64,
            y: source.y as f64 - inset_y as f64,
            width: side,
            height: side,
            rotation_degrees: angle_degrees,
            preview,
        },
        source,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
