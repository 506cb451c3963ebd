//! Pixel blending on straight-alpha RGBA rasters.

use crate::decode::Raster;

/// Source-over composite of `src` (scaled by `opacity`) onto `dst`.
///
/// Fully opaque sources at full opacity replace the destination exactly,
/// fully transparent ones leave it untouched.
#[inline]
pub fn source_over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    if sa >= 1.0 {
        return src;
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    out
}

/// Draw `src` onto `dst` with its top-left at (`left`, `top`), clipped to `dst`.
pub fn draw_raster(dst: &mut Raster, src: &Raster, left: i64, top: i64, opacity: f32) {
    let x_start = left.max(0);
    let y_start = top.max(0);
    let x_end = (left + src.width as i64).min(dst.width as i64);
    let y_end = (top + src.height as i64).min(dst.height as i64);

    for y in y_start..y_end {
        for x in x_start..x_end {
            let s = src.pixel((x - left) as u32, (y - top) as u32);
            if s[3] == 0 {
                continue;
            }
            let d = dst.pixel(x as u32, y as u32);
            dst.set_pixel(x as u32, y as u32, source_over(d, s, opacity));
        }
    }
}

/// Blend a solid color over the pixels whose centers fall inside the box.
pub fn fill_rect(dst: &mut Raster, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 4]) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(dst.width as i64);
    let y1 = y1.min(dst.height as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            let d = dst.pixel(x as u32, y as u32);
            dst.set_pixel(x as u32, y as u32, source_over(d, color, 1.0));
        }
    }
}
