//! Raster decoding for RotaLab.
//!
//! This module provides functionality for:
//! - Decoding source images handed over by the ingestion collaborator
//!   (any format the `image` crate was built with, EXIF orientation applied)
//! - Decoding the lossless PNG buffers used for history snapshots and fragments
//!
//! All operations are synchronous. The engine models the asynchronous
//! nature of decoding at a higher level (see `engine::DecodeRequest`).

mod formats;
mod types;

pub use formats::{decode_image, decode_png};
pub use types::{DecodeError, Orientation, Raster};
