//! Engine configuration.
//!
//! Every field has a default matching the stock editor, so a partially
//! specified configuration (for instance a JS object with a single key) is
//! valid input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::ExportFormat;
use crate::selection::DEFAULT_SELECTION_THRESHOLD;
use crate::transform::InterpolationFilter;

/// Default fragment buffer factor relative to the longest selection side.
pub const DEFAULT_FRAGMENT_SCALE: f64 = 1.5;

/// Errors reported by [`EngineConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Selection threshold must be a finite, non-negative number, got {0}")]
    InvalidThreshold(f64),

    #[error("Fragment scale {0} cannot hold a rotated selection without clipping (minimum is sqrt(2))")]
    FragmentScaleTooSmall(f64),

    #[error("Opacity must be within 0.0..=1.0, got {0}")]
    InvalidOpacity(f32),

    #[error("Dash pattern segments must be non-zero, got {0:?}")]
    InvalidDash([u32; 2]),

    #[error("JPEG quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),
}

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Visual feedback drawn over the base raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    /// Dashed outline color (selection and fragment).
    pub stroke_color: Color,
    /// Outline width in raster pixels, centered on the rectangle edge.
    pub stroke_width: u32,
    /// Dash pattern as `[on, off]` lengths along the outline.
    pub dash: [u32; 2],
    /// Translucent fill inside a live selection.
    pub selection_fill: Color,
    /// Opacity applied to a pending fragment while it is being placed.
    pub fragment_opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::rgba(0x9b, 0x87, 0xf5, 255),
            stroke_width: 3,
            dash: [10, 5],
            selection_fill: Color::rgba(155, 135, 245, 26),
            fragment_opacity: 0.7,
        }
    }
}

/// Tunables for [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Dead zone: selections must be strictly larger on both axes.
    pub selection_threshold: f64,
    /// Fragment buffer side as a multiple of the longest selection side.
    pub fragment_scale: f64,
    /// Resampling used when baking the rotation into a fragment.
    pub interpolation: InterpolationFilter,
    /// Overlay colors and stroke.
    pub overlay: OverlayStyle,
    /// Format returned by `Engine::export`.
    pub export_format: ExportFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selection_threshold: DEFAULT_SELECTION_THRESHOLD,
            fragment_scale: DEFAULT_FRAGMENT_SCALE,
            interpolation: InterpolationFilter::default(),
            overlay: OverlayStyle::default(),
            export_format: ExportFormat::default(),
        }
    }
}

impl EngineConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.selection_threshold.is_finite() || self.selection_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.selection_threshold));
        }
        if !self.fragment_scale.is_finite() || self.fragment_scale < std::f64::consts::SQRT_2 {
            return Err(ConfigError::FragmentScaleTooSmall(self.fragment_scale));
        }
        if !(0.0..=1.0).contains(&self.overlay.fragment_opacity) {
            return Err(ConfigError::InvalidOpacity(self.overlay.fragment_opacity));
        }
        if self.overlay.dash.contains(&0) {
            return Err(ConfigError::InvalidDash(self.overlay.dash));
        }
        if let ExportFormat::Jpeg { quality } = self.export_format {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::InvalidJpegQuality(quality));
            }
        }
        Ok(())
    }
}
