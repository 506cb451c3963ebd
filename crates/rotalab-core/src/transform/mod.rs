//! Raster transforms used to build fragments: region copy and rotation.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Regions are on the pixel grid, already clipped to the raster
//! - Origin is top-left corner

mod crop;
mod rotation;

pub use crop::crop_region;
pub use rotation::{compute_rotated_bounds, rotate_into_square, InterpolationFilter};
