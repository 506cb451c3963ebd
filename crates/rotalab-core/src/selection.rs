//! Rectangle-drag selection tracking.
//!
//! A drag starts at pointer-down, grows on every pointer-move and is
//! finalized at pointer-up. Only boxes larger than the dead zone on both
//! axes survive finalization; anything smaller is treated as a stray click.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Default dead zone, in raster pixels, on each axis.
pub const DEFAULT_SELECTION_THRESHOLD: f64 = 10.0;

/// Result of ending a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelectionOutcome {
    /// The box cleared the dead zone and is ready for rotation.
    Ready(Rect),
    /// The box was too small and has been dropped.
    Discarded,
}

/// Tracks one rectangle-drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTracker {
    threshold: f64,
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: Point,
    current: Point,
}

impl SelectionTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Begin a new drag, discarding any drag already in progress.
    pub fn begin(&mut self, at: Point) {
        self.drag = Some(Drag {
            start: at,
            current: at,
        });
    }

    /// Move the free corner. Returns the live box, or `None` when idle.
    pub fn update(&mut self, to: Point) -> Option<Rect> {
        let drag = self.drag.as_mut()?;
        drag.current = to;
        Some(Rect::from_corners(drag.start, drag.current))
    }

    /// The box spanned by the current drag, if any.
    pub fn current(&self) -> Option<Rect> {
        self.drag.map(|d| Rect::from_corners(d.start, d.current))
    }

    /// End the drag. The box is clipped to `bounds` before the dead-zone
    /// check, so a ready selection always lies inside `bounds`.
    ///
    /// Returns `None` when no drag was in progress.
    pub fn finish(&mut self, bounds: &Rect) -> Option<SelectionOutcome> {
        let drag = self.drag.take()?;
        let rect = Rect::from_corners(drag.start, drag.current).intersect(bounds);
        if self.accepts(&rect) {
            Some(SelectionOutcome::Ready(rect))
        } else {
            Some(SelectionOutcome::Discarded)
        }
    }

    /// Whether `rect` clears the dead zone (strictly larger on both axes).
    pub fn accepts(&self, rect: &Rect) -> bool {
        rect.width > self.threshold && rect.height > self.threshold
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTION_THRESHOLD)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
