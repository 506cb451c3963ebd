//! Interactive repositioning of a pending fragment.

use crate::fragment::RotatedFragment;
use crate::geometry::Point;

/// Owns the one pending fragment and tracks a drag on it.
///
/// Owning the fragment makes "dragging with no fragment" unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementController {
    fragment: RotatedFragment,
    /// Pointer position relative to the fragment's top-left, while dragging.
    drag_offset: Option<Point>,
}

impl PlacementController {
    pub fn new(fragment: RotatedFragment) -> Self {
        Self {
            fragment,
            drag_offset: None,
        }
    }

    pub fn fragment(&self) -> &RotatedFragment {
        &self.fragment
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    /// Pointer-down. Starts a drag when `at` hits the fragment.
    pub fn press(&mut self, at: Point) -> bool {
        if !self.fragment.contains(at) {
            return false;
        }
        self.drag_offset = Some(at - self.fragment.top_left());
        true
    }

    /// Pointer-move. Moves the fragment rigidly; returns whether it moved.
    pub fn drag(&mut self, to: Point) -> bool {
        let Some(offset) = self.drag_offset else {
            return false;
        };
        let target = to - offset;
        if target == self.fragment.top_left() {
            return false;
        }
        self.fragment.move_to(target);
        true
    }

    /// Pointer-up. Returns whether a drag was in progress.
    pub fn release(&mut self) -> bool {
        self.drag_offset.take().is_some()
    }

    pub fn into_fragment(self) -> RotatedFragment {
        self.fragment
    }
}
