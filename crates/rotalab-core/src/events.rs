//! Notifications emitted by the engine.
//!
//! Events are queued in order and handed out by `Engine::drain_events`.

use serde::Serialize;

use crate::fragment::FragmentId;
use crate::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// A drag-select finished outside the dead zone.
    SelectionReady { selection: Rect },
    /// A fragment was extracted and is pending placement.
    #[serde(rename_all = "camelCase")]
    RotationApplied {
        fragment_id: FragmentId,
        rotation_degrees: i32,
    },
    /// A fragment was drawn permanently into the base raster.
    #[serde(rename_all = "camelCase")]
    PlacementCommitted { fragment_id: FragmentId, x: f64, y: f64 },
    /// A snapshot was restored.
    UndoPerformed { remaining: usize },
    /// Undo was requested with nothing to restore.
    HistoryEmpty,
    /// An operation failed; the engine is unchanged.
    Failed { message: String },
}

impl EngineEvent {
    /// The `kind` tag this event serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::SelectionReady { .. } => "selection-ready",
            EngineEvent::RotationApplied { .. } => "rotation-applied",
            EngineEvent::PlacementCommitted { .. } => "placement-committed",
            EngineEvent::UndoPerformed { .. } => "undo-performed",
            EngineEvent::HistoryEmpty => "history-empty",
            EngineEvent::Failed { .. } => "failed",
        }
    }
}
