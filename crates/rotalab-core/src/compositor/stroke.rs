//! Dashed rectangle outlines.
//!
//! The stroke is centered on the rectangle edge like a 2D canvas
//! `strokeRect`. Dash phase runs clockwise from the top-left corner.

use std::ops::Range;

use super::blend::source_over;
use crate::decode::Raster;

/// Rows or columns covered by a band of `width` centered on `edge`.
///
/// A pixel belongs to the band when its center lies in `[edge - w/2, edge + w/2)`.
fn band(edge: i64, width: u32) -> Range<i64> {
    let half = width as f64 / 2.0;
    let lo = (edge as f64 - half - 0.5).ceil() as i64;
    let hi = (edge as f64 + half - 0.5).ceil() as i64;
    lo..hi
}

/// Stroke the outline of `[x0, x1) x [y0, y1)` with a `[on, off]` dash.
pub fn stroke_dashed_rect(
    dst: &mut Raster,
    (x0, y0, x1, y1): (i64, i64, i64, i64),
    width: u32,
    dash: [u32; 2],
    color: [u8; 4],
) {
    if width == 0 {
        return;
    }
    let top = band(y0, width);
    let bottom = band(y1, width);
    let left = band(x0, width);
    let right = band(x1, width);

    let w = (x1 - x0) as f64;
    let h = (y1 - y0) as f64;
    let period = (dash[0] + dash[1]).max(1) as f64;
    let on = dash[0] as f64;

    let rows = top.start.max(0)..bottom.end.min(dst.height as i64);
    let cols = left.start.max(0)..right.end.min(dst.width as i64);

    for y in rows {
        let horizontal = top.contains(&y) || bottom.contains(&y);
        for x in cols.clone() {
            if !horizontal && !left.contains(&x) && !right.contains(&x) {
                continue;
            }

            let cx = x as f64 + 0.5;
            let cy = y as f64 + 0.5;
            // Distance along the perimeter, clockwise from the top-left corner
            let t = if top.contains(&y) {
                cx - x0 as f64
            } else if right.contains(&x) {
                w + (cy - y0 as f64)
            } else if bottom.contains(&y) {
                w + h + (x1 as f64 - cx)
            } else {
                2.0 * w + h + (y1 as f64 - cy)
            };

            if t.rem_euclid(period) < on {
                let d = dst.pixel(x as u32, y as u32);
                dst.set_pixel(x as u32, y as u32, source_over(d, color, 1.0));
            }
        }
    }
}
