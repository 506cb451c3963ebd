//! Region copy out of a raster.
//!
//! The fragment extractor lifts the selected pixels into their own buffer
//! before rotating them. Coordinates are on the pixel grid and have already
//! been clipped to the raster (see `Rect::to_pixel_rect`).

use crate::decode::Raster;
use crate::geometry::PixelRect;

/// Copy `region` out of `image` into a new raster.
///
/// # Behavior
///
/// - The region is clamped to the image bounds again, so an oversized
///   region yields only the overlapping pixels
/// - Minimum output dimension is 1x1 pixels
/// - A region covering the whole image returns a copy of the original
pub fn crop_region(image: &Raster, region: PixelRect) -> Raster {
    // Fast path: full region returns a clone
    if region.x == 0 && region.y == 0 && region.width >= image.width && region.height >= image.height
    {
        return image.clone();
    }

    let left = region.x.min(image.width.saturating_sub(1));
    let top = region.y.min(image.height.saturating_sub(1));
    let right = region.right().min(image.width);
    let bottom = region.bottom().min(image.height);

    let out_width = right.saturating_sub(left).max(1);
    let out_height = bottom.saturating_sub(top).max(1);

    let mut output = vec![0u8; (out_width as usize) * (out_height as usize) * 4];
    let row_bytes = out_width as usize * 4;

    // Copy pixel data row by row
    for y in 0..out_height {
        let src_start = (((top + y) as usize) * image.width as usize + left as usize) * 4;
        let dst_start = y as usize * row_bytes;
        output[dst_start..dst_start + row_bytes]
            .copy_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    Raster::new(out_width, out_height, output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
