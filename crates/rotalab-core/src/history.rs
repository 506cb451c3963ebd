//! Undo history of full raster snapshots.
//!
//! Each entry holds a lossless PNG of the whole base raster, so restoring is
//! a decode plus a swap with no dependence on what happened in between.

use serde::Serialize;

/// One restorable state of the base raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// PNG encoding of the base raster.
    #[serde(skip)]
    pub image_data: Vec<u8>,
    /// Milliseconds since the Unix epoch when the snapshot was taken.
    pub timestamp: u64,
    /// Rotation that was about to be applied when the snapshot was taken.
    pub rotation_degrees: i32,
}

/// Last-in first-out stack of [`HistoryItem`]s. Unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryManager {
    items: Vec<HistoryItem>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<HistoryItem> {
        self.items.pop()
    }

    pub fn last(&self) -> Option<&HistoryItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
