//! Engine error taxonomy.
//!
//! None of these are fatal: every operation that fails leaves the engine in
//! the state it was in before the call, still accepting input.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No base raster yet, ingestion has not completed.
    #[error("No image loaded")]
    MissingSurface,

    /// No selection, or one that is below the dead zone or outside the raster.
    #[error("No valid selection")]
    InvalidSelection,

    /// Undo requested with nothing to restore.
    #[error("Nothing to undo")]
    EmptyHistory,

    /// The operation or tool is not available in the current mode.
    #[error("Not available in the current tool mode: {0}")]
    InvalidToolMode(String),

    /// No fragment is pending placement.
    #[error("No fragment to place")]
    MissingFragment,

    /// An encoded buffer could not be decoded back into pixels.
    #[error("Failed to decode raster: {0}")]
    DecodeFailure(String),

    /// A raster could not be encoded (snapshot, fragment or export).
    #[error("Failed to encode raster: {0}")]
    EncodeFailure(String),
}

impl From<DecodeError> for EngineError {
    fn from(err: DecodeError) -> Self {
        EngineError::DecodeFailure(err.to_string())
    }
}

impl From<EncodeError> for EngineError {
    fn from(err: EncodeError) -> Self {
        EngineError::EncodeFailure(err.to_string())
    }
}
