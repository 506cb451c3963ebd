//! RotaLab Core - Selection, rotation and placement engine
//!
//! This crate provides the editing core for RotaLab: a pointer-driven
//! rectangle selection, extraction of the selection into a rotated fragment,
//! interactive placement of that fragment, and a snapshot-based undo history.
//! It is pure Rust with no JS types; the `rotalab-wasm` crate exposes it to
//! the browser.

pub mod clock;
pub mod compositor;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod error;
pub mod events;
pub mod fragment;
pub mod geometry;
pub mod history;
pub mod placement;
pub mod selection;
pub mod transform;

pub use clock::{Clock, SystemClock};
pub use config::{Color, ConfigError, EngineConfig, OverlayStyle};
pub use decode::{decode_image, DecodeError, Raster};
pub use encode::{encode_raster, EncodeError, ExportFormat};
pub use engine::{
    export_file_name, DecodeOutcome, DecodeRequest, DecodeStatus, Engine, ToolMode,
};
pub use error::EngineError;
pub use events::EngineEvent;
pub use fragment::{FragmentId, RotatedFragment};
pub use geometry::{CanvasLayout, PixelRect, Point, Rect};
pub use history::HistoryItem;
pub use transform::InterpolationFilter;

/// Crate version, as reported to the presentation layer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
