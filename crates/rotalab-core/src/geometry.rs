//! Points, rectangles and pointer-to-raster coordinate mapping.
//!
//! # Coordinate System
//!
//! - Raster space: source pixels, origin at the top-left, y pointing down
//! - Client space: display pixels as reported by pointer events
//! - The canvas element may be scaled by layout, so its rendered size can
//!   differ from its backing-store size (the raster dimensions)

use serde::{Deserialize, Serialize};

/// A point in raster or client space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle in raster space.
///
/// Always normalized: `(x, y)` is the top-left corner and both extents are
/// non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build the normalized rectangle spanned by two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Overlap with `other`. Disjoint rectangles give an empty rectangle.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        Rect::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }

    /// Inclusive containment on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Snap to the pixel grid and clip against a `width` x `height` raster.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the raster.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Option<PixelRect> {
        let left = self.x.round().max(0.0);
        let top = self.y.round().max(0.0);
        let right = (self.x + self.width).round().min(width as f64);
        let bottom = (self.y + self.height).round().min(height as f64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// A rectangle on the pixel grid, guaranteed to fit the raster it was clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Geometry of the canvas element as laid out on screen.
///
/// Mirrors what a browser reports through `getBoundingClientRect()` together
/// with the canvas backing-store size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasLayout {
    /// Client-space x of the canvas's top-left corner.
    pub left: f64,
    /// Client-space y of the canvas's top-left corner.
    pub top: f64,
    /// Displayed width in client pixels.
    pub rendered_width: f64,
    /// Displayed height in client pixels.
    pub rendered_height: f64,
    /// Backing-store width in raster pixels.
    pub backing_width: u32,
    /// Backing-store height in raster pixels.
    pub backing_height: u32,
}

impl CanvasLayout {
    /// Identity layout: the canvas is displayed unscaled at the client origin.
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            rendered_width: width as f64,
            rendered_height: height as f64,
            backing_width: width,
            backing_height: height,
        }
    }

    /// Per-axis factor from client pixels to raster pixels.
    ///
    /// A zero rendered extent (collapsed element) maps with factor 1.
    pub fn scale(&self) -> (f64, f64) {
        let sx = if self.rendered_width > 0.0 {
            self.backing_width as f64 / self.rendered_width
        } else {
            1.0
        };
        let sy = if self.rendered_height > 0.0 {
            self.backing_height as f64 / self.rendered_height
        } else {
            1.0
        };
        (sx, sy)
    }

    /// Convert a pointer position in client space to raster space.
    ///
    /// `raster = (client - canvasTopLeft) * (backingSize / renderedSize)` per axis.
    /// No clamping: positions outside the canvas map outside the raster.
    pub fn to_raster(&self, client: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new((client.x - self.left) * sx, (client.y - self.top) * sy)
    }
}
