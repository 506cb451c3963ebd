//! The editing engine: selection, rotation, placement and undo.
//!
//! [`Engine`] is a single-threaded state machine driven by pointer events
//! and explicit commands. The editor state is one tagged value, so
//! combinations such as "dragging a fragment while no fragment exists"
//! cannot be represented.
//!
//! ```text
//! Idle --pointer_down--> Selecting --pointer_up (ready)--> Fragmenting
//!   ^                        |                                  |
//!   +------(too small)-------+                          apply_rotation
//!   ^                                                           v
//!   +---------------commit / cancel / undo-------------------- Placing
//! ```
//!
//! The only asynchronous step is decoding the fragment before commit. It is
//! split into [`Engine::request_commit`], [`DecodeRequest::run`] and
//! [`Engine::complete_decode`]; a generation counter makes late completions
//! after a cancel, undo, reset or new extraction harmless.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::compositor::{Compositor, Overlay};
use crate::config::{ConfigError, EngineConfig};
use crate::decode::{decode_image, decode_png, DecodeError, Raster};
use crate::encode::ExportFormat;
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::fragment::{extract_fragment, FragmentId, RotatedFragment};
use crate::geometry::{CanvasLayout, Point, Rect};
use crate::history::{HistoryItem, HistoryManager};
use crate::placement::PlacementController;
use crate::selection::{SelectionOutcome, SelectionTracker};

/// Largest rotation magnitude, in degrees.
pub const MAX_ROTATION_DEGREES: i32 = 180;

/// Which gesture handler is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    Select,
    Rotate,
    Place,
}

impl ToolMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Rotate => "rotate",
            ToolMode::Place => "place",
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(ToolMode::Select),
            "rotate" => Ok(ToolMode::Rotate),
            "place" => Ok(ToolMode::Place),
            _ => Err(EngineError::InvalidToolMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EditorState {
    /// Select mode, no drag. May remember a finished selection.
    Idle { selection: Option<Rect> },
    /// Select mode, rectangle drag in progress.
    Selecting(SelectionTracker),
    /// Rotate mode: a selection is ready for extraction.
    Fragmenting { selection: Rect },
    /// Place mode: one fragment is pending commit.
    Placing {
        selection: Rect,
        placement: PlacementController,
    },
}

impl EditorState {
    fn tool(&self) -> ToolMode {
        match self {
            EditorState::Idle { .. } | EditorState::Selecting(_) => ToolMode::Select,
            EditorState::Fragmenting { .. } => ToolMode::Rotate,
            EditorState::Placing { .. } => ToolMode::Place,
        }
    }

    fn selection(&self) -> Option<Rect> {
        match self {
            EditorState::Idle { selection } => *selection,
            EditorState::Selecting(tracker) => tracker.current(),
            EditorState::Fragmenting { selection } | EditorState::Placing { selection, .. } => {
                Some(*selection)
            }
        }
    }
}

/// A fragment decode issued by [`Engine::request_commit`].
///
/// Owns a copy of the encoded fragment so it can run anywhere, including
/// after the engine has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    generation: u64,
    fragment_id: FragmentId,
    image_data: Vec<u8>,
}

impl DecodeRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fragment_id(&self) -> FragmentId {
        self.fragment_id
    }

    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    /// Decode the fragment pixels.
    pub fn run(self) -> DecodeOutcome {
        let result = decode_png(&self.image_data);
        DecodeOutcome {
            generation: self.generation,
            fragment_id: self.fragment_id,
            result,
        }
    }

    /// Attach pixels decoded elsewhere (for example by the browser).
    pub fn resolve(self, result: Result<Raster, DecodeError>) -> DecodeOutcome {
        DecodeOutcome {
            generation: self.generation,
            fragment_id: self.fragment_id,
            result,
        }
    }
}

/// A finished decode, ready to hand back to [`Engine::complete_decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    generation: u64,
    fragment_id: FragmentId,
    result: Result<Raster, DecodeError>,
}

/// What [`Engine::complete_decode`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeStatus {
    /// The fragment was committed into the base raster.
    Applied,
    /// The engine moved on since the request; nothing changed.
    Stale,
}

/// `rotated-image-<timestamp>.<ext>`
pub fn export_file_name(timestamp_ms: u64, format: ExportFormat) -> String {
    format!("rotated-image-{timestamp_ms}.{}", format.extension())
}

pub struct Engine {
    config: EngineConfig,
    compositor: Compositor,
    history: HistoryManager,
    state: EditorState,
    rotation: i32,
    layout: CanvasLayout,
    generation: u64,
    next_fragment_id: FragmentId,
    events: Vec<EngineEvent>,
    dirty: bool,
    clock: Box<dyn Clock>,
}

impl Engine {
    /// Create an engine with no image loaded, timestamps from [`SystemClock`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            compositor: Compositor::new(),
            history: HistoryManager::new(),
            state: EditorState::Idle { selection: None },
            rotation: 0,
            layout: CanvasLayout::unscaled(0, 0),
            generation: 0,
            next_fragment_id: 1,
            events: Vec::new(),
            dirty: false,
            clock,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Replace the base raster, clearing selection, fragment and history.
    pub fn load_image(&mut self, raster: Raster) -> Result<(), EngineError> {
        if raster.is_empty() {
            return Err(DecodeError::InvalidDimensions {
                width: raster.width,
                height: raster.height,
            }
            .into());
        }
        self.reset();
        log::info!("loaded {}x{} image", raster.width, raster.height);
        self.layout = CanvasLayout::unscaled(raster.width, raster.height);
        self.compositor.load(raster);
        Ok(())
    }

    /// Decode PNG or JPEG bytes (EXIF orientation applied) and load them.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let raster = decode_image(bytes)?;
        self.load_image(raster)
    }

    /// Drop the image and every piece of editing state.
    pub fn reset(&mut self) {
        self.compositor.unload();
        self.history.clear();
        self.state = EditorState::Idle { selection: None };
        self.rotation = 0;
        self.layout = CanvasLayout::unscaled(0, 0);
        self.invalidate();
        self.dirty = true;
    }

    pub fn base(&self) -> Option<&Raster> {
        self.compositor.base()
    }

    pub fn has_image(&self) -> bool {
        self.compositor.base().is_some()
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Update the on-screen geometry of the canvas.
    pub fn set_layout(&mut self, layout: CanvasLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> CanvasLayout {
        self.layout
    }

    /// Pointer pressed at `client`. Returns whether the press was handled.
    pub fn pointer_down(&mut self, client: Point) -> bool {
        if !self.has_image() {
            return false;
        }
        let at = self.layout.to_raster(client);

        match &mut self.state {
            EditorState::Idle { .. } | EditorState::Selecting(_) => {
                let mut tracker = SelectionTracker::new(self.config.selection_threshold);
                tracker.begin(at);
                self.state = EditorState::Selecting(tracker);
                self.dirty = true;
                true
            }
            EditorState::Fragmenting { .. } => false,
            EditorState::Placing { placement, .. } => placement.press(at),
        }
    }

    /// Pointer moved to `client`. Returns whether anything visible changed.
    pub fn pointer_move(&mut self, client: Point) -> bool {
        let at = self.layout.to_raster(client);

        let changed = match &mut self.state {
            EditorState::Selecting(tracker) => tracker.update(at).is_some(),
            EditorState::Placing { placement, .. } => placement.drag(at),
            _ => false,
        };
        self.dirty |= changed;
        changed
    }

    /// Pointer released. Finalizes a selection drag or ends a fragment drag.
    pub fn pointer_up(&mut self, client: Point) -> bool {
        let at = self.layout.to_raster(client);

        match &mut self.state {
            EditorState::Selecting(tracker) => {
                tracker.update(at);
                self.finish_selection();
                true
            }
            EditorState::Placing { placement, .. } => placement.release(),
            _ => false,
        }
    }

    /// Pointer left the canvas. Ends any drag the same way a release does,
    /// at the last known position.
    pub fn pointer_leave(&mut self) -> bool {
        match &mut self.state {
            EditorState::Selecting(_) => {
                self.finish_selection();
                true
            }
            EditorState::Placing { placement, .. } => placement.release(),
            _ => false,
        }
    }

    fn finish_selection(&mut self) {
        let bounds = self
            .compositor
            .base()
            .map(|base| Rect::new(0.0, 0.0, f64::from(base.width), f64::from(base.height)));
        let outcome = match (&mut self.state, bounds) {
            (EditorState::Selecting(tracker), Some(bounds)) => tracker.finish(&bounds),
            _ => None,
        };

        match outcome {
            Some(SelectionOutcome::Ready(selection)) => {
                log::debug!(
                    "selection ready: {}x{} at ({}, {})",
                    selection.width,
                    selection.height,
                    selection.x,
                    selection.y
                );
                self.state = EditorState::Fragmenting { selection };
                self.rotation = 0;
                self.events.push(EngineEvent::SelectionReady { selection });
            }
            _ => {
                log::debug!("selection below dead zone, discarded");
                self.state = EditorState::Idle { selection: None };
            }
        }
        self.dirty = true;
    }

    // ========================================================================
    // Tool mode and rotation
    // ========================================================================

    pub fn tool(&self) -> ToolMode {
        self.state.tool()
    }

    /// Switch tool. Illegal switches are ignored and return `false`:
    /// `Rotate` needs a selection and `Place` needs a pending fragment.
    ///
    /// Leaving `Place` drops the pending fragment. `Select` behaves like
    /// [`Engine::cancel`]. `Rotate` puts the lifted pixels back and reopens
    /// the same selection at the same angle.
    pub fn set_tool(&mut self, mode: ToolMode) -> bool {
        if matches!(self.state, EditorState::Placing { .. }) {
            return match mode {
                ToolMode::Place => true,
                ToolMode::Select => {
                    self.cancel();
                    true
                }
                ToolMode::Rotate => {
                    let result = self.try_reopen_selection();
                    self.report(result).is_ok()
                }
            };
        }

        let (accepted, next) = match (mode, &self.state) {
            (ToolMode::Select, EditorState::Idle { .. } | EditorState::Selecting(_)) => {
                (true, None)
            }
            (ToolMode::Select, EditorState::Fragmenting { selection }) => (
                true,
                Some(EditorState::Idle {
                    selection: Some(*selection),
                }),
            ),
            (ToolMode::Rotate, EditorState::Idle { selection: Some(selection) }) => (
                true,
                Some(EditorState::Fragmenting {
                    selection: *selection,
                }),
            ),
            (ToolMode::Rotate, EditorState::Fragmenting { .. }) => (true, None),
            _ => (false, None),
        };

        if let Some(next) = next {
            self.state = next;
        }
        if !accepted {
            log::warn!("tool switch to {mode} rejected in {} mode", self.tool());
        }
        accepted
    }

    fn try_reopen_selection(&mut self) -> Result<(), EngineError> {
        let selection = match &self.state {
            EditorState::Placing { selection, .. } => *selection,
            _ => return Err(EngineError::MissingFragment),
        };
        // Top of the history is the raster from just before the lift.
        let item = self.history.pop().ok_or(EngineError::EmptyHistory)?;
        let raster = decode_png(&item.image_data)?;

        self.compositor.restore(raster);
        self.state = EditorState::Fragmenting { selection };
        self.invalidate();
        self.dirty = true;
        log::debug!("pending fragment dropped, back to rotate at {} deg", self.rotation);
        Ok(())
    }

    pub fn selection(&self) -> Option<Rect> {
        self.state.selection()
    }

    /// Selection size rounded to whole pixels.
    pub fn selection_size(&self) -> Option<(u32, u32)> {
        self.selection()
            .map(|r| (r.width.round() as u32, r.height.round() as u32))
    }

    pub fn fragment(&self) -> Option<&RotatedFragment> {
        match &self.state {
            EditorState::Placing { placement, .. } => Some(placement.fragment()),
            _ => None,
        }
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Set the angle for the next extraction, clamped to `[-180, 180]`.
    ///
    /// Needs a finished selection and no pending fragment.
    pub fn set_rotation(&mut self, degrees: i32) -> Result<i32, EngineError> {
        match &self.state {
            EditorState::Placing { .. } => {
                return Err(EngineError::InvalidToolMode(ToolMode::Place.to_string()))
            }
            EditorState::Idle { selection: None } | EditorState::Selecting(_) => {
                return Err(EngineError::InvalidSelection)
            }
            _ => {}
        }
        self.rotation = degrees.clamp(-MAX_ROTATION_DEGREES, MAX_ROTATION_DEGREES);
        Ok(self.rotation)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Lift the selection into a rotated fragment and enter `Place` mode.
    ///
    /// Only valid in `Rotate` mode; a selection kept in `Select` mode must
    /// be switched to `Rotate` first.
    ///
    /// The pre-extraction raster is pushed onto the history before the
    /// source region is cleared. On error nothing changes.
    pub fn apply_rotation(&mut self) -> Result<FragmentId, EngineError> {
        let result = self.try_apply_rotation();
        self.report(result)
    }

    fn try_apply_rotation(&mut self) -> Result<FragmentId, EngineError> {
        let base = self.compositor.surface()?;
        let selection = match &self.state {
            EditorState::Fragmenting { selection } => *selection,
            EditorState::Placing { .. } => {
                return Err(EngineError::InvalidToolMode(ToolMode::Place.to_string()))
            }
            EditorState::Idle { selection: Some(_) } => {
                return Err(EngineError::InvalidToolMode(ToolMode::Select.to_string()))
            }
            _ => return Err(EngineError::InvalidSelection),
        };

        let extraction = extract_fragment(
            base,
            &selection,
            self.rotation,
            self.next_fragment_id,
            self.config.fragment_scale,
            self.config.interpolation,
        )?;
        let snapshot = self.compositor.snapshot()?;

        self.history.push(HistoryItem {
            image_data: snapshot,
            timestamp: self.clock.now_millis(),
            rotation_degrees: self.rotation,
        });
        self.compositor.clear_region(extraction.source)?;

        let fragment = extraction.fragment;
        let id = fragment.id;
        self.next_fragment_id += 1;
        self.invalidate();
        self.events.push(EngineEvent::RotationApplied {
            fragment_id: id,
            rotation_degrees: fragment.rotation_degrees,
        });
        log::info!(
            "fragment {id} rotated {} deg, {} snapshot(s) in history",
            fragment.rotation_degrees,
            self.history.len()
        );
        self.state = EditorState::Placing {
            selection,
            placement: PlacementController::new(fragment),
        };
        self.dirty = true;
        Ok(id)
    }

    /// Start committing the pending fragment. The returned request must be
    /// run and handed back to [`Engine::complete_decode`].
    pub fn request_commit(&mut self) -> Result<DecodeRequest, EngineError> {
        let result = match &self.state {
            EditorState::Placing { placement, .. } => {
                let fragment = placement.fragment();
                Ok(DecodeRequest {
                    generation: self.generation,
                    fragment_id: fragment.id,
                    image_data: fragment.image_data.clone(),
                })
            }
            _ => Err(EngineError::MissingFragment),
        };
        self.report(result)
    }

    /// Apply a finished decode if it still belongs to the pending fragment.
    ///
    /// The fragment is drawn at its position at completion time, so a drag
    /// between request and completion is honored.
    pub fn complete_decode(&mut self, outcome: DecodeOutcome) -> Result<DecodeStatus, EngineError> {
        let current = match &self.state {
            EditorState::Placing { placement, .. } => Some(placement.fragment().id),
            _ => None,
        };
        if outcome.generation != self.generation || current != Some(outcome.fragment_id) {
            log::warn!(
                "discarding stale decode for fragment {} (generation {}, now {})",
                outcome.fragment_id,
                outcome.generation,
                self.generation
            );
            return Ok(DecodeStatus::Stale);
        }

        let result = self.apply_decoded(outcome.result);
        self.report(result).map(|()| DecodeStatus::Applied)
    }

    fn apply_decoded(&mut self, decoded: Result<Raster, DecodeError>) -> Result<(), EngineError> {
        let pixels = decoded?;
        let position = match &self.state {
            EditorState::Placing { placement, .. } => placement.fragment().top_left(),
            _ => return Err(EngineError::MissingFragment),
        };
        self.compositor.commit_fragment(&pixels, position)?;

        let state = std::mem::replace(&mut self.state, EditorState::Idle { selection: None });
        if let EditorState::Placing { placement, .. } = state {
            let fragment = placement.into_fragment();
            log::info!(
                "fragment {} committed at ({}, {})",
                fragment.id,
                fragment.x,
                fragment.y
            );
            self.events.push(EngineEvent::PlacementCommitted {
                fragment_id: fragment.id,
                x: fragment.x,
                y: fragment.y,
            });
        }
        self.rotation = 0;
        self.invalidate();
        self.dirty = true;
        Ok(())
    }

    /// Commit the pending fragment synchronously.
    pub fn commit(&mut self) -> Result<(), EngineError> {
        let request = self.request_commit()?;
        let outcome = request.run();
        self.complete_decode(outcome).map(|_| ())
    }

    /// Rotate the selection and commit it immediately where it was.
    pub fn apply_rotation_in_place(&mut self) -> Result<(), EngineError> {
        self.apply_rotation()?;
        self.commit()
    }

    /// Drop the selection and any pending fragment. The base raster is left
    /// as it is.
    pub fn cancel(&mut self) {
        if matches!(self.state, EditorState::Placing { .. }) {
            log::debug!("pending fragment discarded");
        }
        self.state = EditorState::Idle { selection: None };
        self.rotation = 0;
        self.invalidate();
        self.dirty = true;
    }

    /// Restore the most recent snapshot.
    ///
    /// Any selection or pending fragment is discarded. A snapshot that fails
    /// to decode is dropped and reported.
    pub fn undo(&mut self) -> Result<(), EngineError> {
        let result = self.try_undo();
        self.report(result)
    }

    fn try_undo(&mut self) -> Result<(), EngineError> {
        let item = self.history.pop().ok_or(EngineError::EmptyHistory)?;
        let raster = decode_png(&item.image_data)?;

        self.compositor.restore(raster);
        self.state = EditorState::Idle { selection: None };
        self.rotation = 0;
        self.invalidate();
        self.dirty = true;

        let remaining = self.history.len();
        log::info!("undo to snapshot from {}, {remaining} left", item.timestamp);
        self.events.push(EngineEvent::UndoPerformed { remaining });
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Current decode generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Encode the base raster in the configured export format.
    pub fn export(&self) -> Result<Vec<u8>, EngineError> {
        self.export_as(self.config.export_format)
    }

    pub fn export_as(&self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        self.compositor.export(format)
    }

    /// Suggested download name for an export made now.
    pub fn export_file_name(&self) -> String {
        export_file_name(self.clock.now_millis(), self.config.export_format)
    }

    /// The base raster with the current overlay drawn on top.
    pub fn render_frame(&self) -> Result<Raster, EngineError> {
        let overlay = match &self.state {
            EditorState::Placing { placement, .. } => Overlay::Fragment(placement.fragment()),
            state => state.selection().map_or(Overlay::None, Overlay::Selection),
        };
        self.compositor.render(overlay, &self.config.overlay)
    }

    /// Whether a redraw is due since the last call. Clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Make every outstanding decode stale.
    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Log a failure and queue its event. The result passes through.
    fn report<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(err) = &result {
            log::warn!("{} mode: {err}", self.tool());
            let event = match err {
                EngineError::EmptyHistory => EngineEvent::HistoryEmpty,
                other => EngineEvent::Failed {
                    message: other.to_string(),
                },
            };
            self.events.push(event);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::encode::encode_png;

    /// Every pixel distinct: `[x, y, 128, 255]`.
    fn pattern(width: u32, height: u32) -> Raster {
        let mut raster = Raster::transparent(width, height);
        for y in 0..height {
            for x in 0..width {
                raster.set_pixel(x, y, [x as u8, y as u8, 128, 255]);
            }
        }
        raster
    }

    fn engine_with(width: u32, height: u32) -> Engine {
        let mut engine =
            Engine::with_clock(EngineConfig::default(), Box::new(FixedClock(1_700_000_000_000)))
                .unwrap();
        engine.load_image(pattern(width, height)).unwrap();
        engine.drain_events();
        engine.take_redraw();
        engine
    }

    fn drag(engine: &mut Engine, from: (f64, f64), to: (f64, f64)) {
        engine.pointer_down(Point::new(from.0, from.1));
        engine.pointer_move(Point::new(to.0, to.1));
        engine.pointer_up(Point::new(to.0, to.1));
    }

    #[test]
    fn test_scenario_rotate_commit_undo() {
        let mut engine = engine_with(200, 200);
        let original = engine.base().unwrap().clone();

        drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
        assert_eq!(engine.selection(), Some(Rect::new(50.0, 50.0, 40.0, 40.0)));
        assert_eq!(engine.tool(), ToolMode::Rotate);

        engine.set_rotation(90).unwrap();
        engine.apply_rotation().unwrap();
        assert_eq!(engine.tool(), ToolMode::Place);
        let fragment = engine.fragment().unwrap();
        assert_eq!((fragment.width, fragment.height), (60, 60));
        assert_eq!((fragment.x, fragment.y), (40.0, 40.0));
        assert_eq!(engine.base().unwrap().pixel(60, 60), [0, 0, 0, 0]);

        engine.commit().unwrap();
        assert_eq!(engine.tool(), ToolMode::Select);
        assert_eq!(engine.rotation(), 0);
        assert!(engine.fragment().is_none());

        // Clockwise quarter turn: top-left corner lands at top-right
        let base = engine.base().unwrap();
        assert_eq!(base.pixel(89, 50), original.pixel(50, 50));
        assert_eq!(base.pixel(50, 50), original.pixel(50, 89));
        assert_eq!(base.pixel(10, 10), original.pixel(10, 10));

        engine.undo().unwrap();
        assert_eq!(engine.base().unwrap(), &original);
        assert_eq!(engine.history_len(), 0);

        let kinds: Vec<_> = engine.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            [
                "selection-ready",
                "rotation-applied",
                "placement-committed",
                "undo-performed"
            ]
        );
    }

    #[test]
    fn test_zero_degree_commit_is_identity() {
        let mut engine = engine_with(120, 80);
        let original = engine.base().unwrap().clone();

        drag(&mut engine, (17.0, 9.0), (61.0, 70.0));
        engine.apply_rotation().unwrap();
        engine.commit().unwrap();

        assert_eq!(engine.base().unwrap(), &original);
    }

    #[test]
    fn test_undo_empty_history() {
        let mut engine = engine_with(50, 50);
        let before = engine.base().unwrap().clone();

        assert_eq!(engine.undo(), Err(EngineError::EmptyHistory));
        assert_eq!(engine.base().unwrap(), &before);
        assert_eq!(engine.drain_events(), vec![EngineEvent::HistoryEmpty]);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_drag_without_commit_leaves_base() {
        let mut engine = engine_with(200, 200);
        drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
        engine.apply_rotation().unwrap();
        let lifted = engine.base().unwrap().clone();

        drag(&mut engine, (70.0, 70.0), (120.0, 130.0));
        assert_eq!(engine.base().unwrap(), &lifted);
        let fragment = engine.fragment().unwrap();
        assert_eq!((fragment.x, fragment.y), (90.0, 100.0));
        assert_eq!(engine.tool(), ToolMode::Place);
    }

    #[test]
    fn test_commit_after_drag_moves_content() {
        let mut engine = engine_with(200, 200);
        let original = engine.base().unwrap().clone();
        drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
        engine.apply_rotation().unwrap();
        drag(&mut engine, (70.0, 70.0), (120.0, 130.0));
        engine.commit().unwrap();

        let base = engine.base().unwrap();
        // Source region cleared, content shifted by (50, 60)
        assert_eq!(base.pixel(55, 55), [0, 0, 0, 0]);
        assert_eq!(base.pixel(100, 110), original.pixel(50, 50));
        assert_eq!(base.pixel(139, 149), original.pixel(89, 89));
    }

    #[test]
    fn test_press_outside_fragment_does_not_drag() {
        let mut engine = engine_with(200, 200);
        drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
        engine.apply_rotation().unwrap();

        assert!(!engine.pointer_down(Point::new(150.0, 150.0)));
        assert!(!engine.pointer_move(Point::new(160.0, 160.0)));
        assert_eq!(engine.fragment().unwrap().top_left(), Point::new(40.0, 40.0));
    }

    #[test]
    fn test_small_selection_discarded() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (20.0, 60.0));

        assert_eq!(engine.tool(), ToolMode::Select);
        assert_eq!(engine.selection(), None);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_reverse_drag_normalizes() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (80.0, 70.0), (30.0, 20.0));
        assert_eq!(engine.selection(), Some(Rect::new(30.0, 20.0, 50.0, 50.0)));
        assert_eq!(engine.selection_size(), Some((50, 50)));
    }

    #[test]
    fn test_layout_scaling() {
        let mut engine = engine_with(200, 200);
        engine.set_layout(CanvasLayout {
            left: 10.0,
            top: 20.0,
            rendered_width: 100.0,
            rendered_height: 100.0,
            backing_width: 200,
            backing_height: 200,
        });

        drag(&mut engine, (35.0, 45.0), (55.0, 65.0));
        assert_eq!(engine.selection(), Some(Rect::new(50.0, 50.0, 40.0, 40.0)));
    }

    #[test]
    fn test_pointer_leave_finalizes_selection() {
        let mut engine = engine_with(100, 100);
        engine.pointer_down(Point::new(10.0, 10.0));
        engine.pointer_move(Point::new(40.0, 50.0));
        assert!(engine.pointer_leave());

        assert_eq!(engine.tool(), ToolMode::Rotate);
        assert_eq!(engine.selection(), Some(Rect::new(10.0, 10.0, 30.0, 40.0)));
    }

    #[test]
    fn test_pointer_leave_ends_fragment_drag() {
        let mut engine = engine_with(200, 200);
        drag(&mut engine, (50.0, 50.0), (90.0, 90.0));
        engine.apply_rotation().unwrap();

        engine.pointer_down(Point::new(70.0, 70.0));
        engine.pointer_move(Point::new(80.0, 70.0));
        assert!(engine.pointer_leave());
        assert!(!engine.pointer_move(Point::new(150.0, 150.0)));
        assert_eq!(engine.fragment().unwrap().top_left(), Point::new(50.0, 40.0));
    }

    #[test]
    fn test_stale_decode_after_cancel() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();
        let lifted = engine.base().unwrap().clone();

        let request = engine.request_commit().unwrap();
        engine.cancel();
        let status = engine.complete_decode(request.run()).unwrap();

        assert_eq!(status, DecodeStatus::Stale);
        assert_eq!(engine.base().unwrap(), &lifted);
        assert_eq!(engine.tool(), ToolMode::Select);
        assert!(engine.can_undo());
    }

    #[test]
    fn test_stale_decode_after_undo() {
        let mut engine = engine_with(100, 100);
        let original = engine.base().unwrap().clone();
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();

        let request = engine.request_commit().unwrap();
        engine.undo().unwrap();
        let status = engine.complete_decode(request.run()).unwrap();

        assert_eq!(status, DecodeStatus::Stale);
        assert_eq!(engine.base().unwrap(), &original);
    }

    #[test]
    fn test_decode_from_earlier_extraction_is_stale() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();
        let old = engine.request_commit().unwrap();
        engine.cancel();

        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();
        assert_eq!(engine.complete_decode(old.run()), Ok(DecodeStatus::Stale));
        assert_eq!(engine.tool(), ToolMode::Place);
    }

    #[test]
    fn test_failed_decode_keeps_fragment() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();
        engine.drain_events();

        let request = engine.request_commit().unwrap();
        let outcome = request.resolve(Err(DecodeError::InvalidFormat));
        let result = engine.complete_decode(outcome);

        assert!(matches!(result, Err(EngineError::DecodeFailure(_))));
        assert_eq!(engine.tool(), ToolMode::Place);
        assert!(matches!(
            engine.drain_events().as_slice(),
            [EngineEvent::Failed { .. }]
        ));
        engine.commit().unwrap();
    }

    #[test]
    fn test_cancel_does_not_touch_raster() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        engine.apply_rotation().unwrap();
        let lifted = engine.base().unwrap().clone();

        engine.cancel();
        assert_eq!(engine.base().unwrap(), &lifted);
        assert_eq!(engine.selection(), None);
        assert_eq!(engine.rotation(), 0);
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn test_tool_mode_rules() {
        let mut engine = engine_with(100, 100);
        assert!(!engine.set_tool(ToolMode::Rotate));
        assert!(!engine.set_tool(ToolMode::Place));
        assert!(engine.set_tool(ToolMode::Select));

        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        assert!(!engine.set_tool(ToolMode::Place));
        assert!(engine.set_tool(ToolMode::Select));
        assert_eq!(engine.tool(), ToolMode::Select);
        assert!(engine.selection().is_some());
        assert!(engine.set_tool(ToolMode::Rotate));
        assert_eq!(engine.tool(), ToolMode::Rotate);

        engine.apply_rotation().unwrap();
        assert!(engine.set_tool(ToolMode::Place));
        assert_eq!(engine.tool(), ToolMode::Place);
        assert!(engine.set_tool(ToolMode::Rotate));
        assert_eq!(engine.tool(), ToolMode::Rotate);

        engine.apply_rotation().unwrap();
        assert!(engine.set_tool(ToolMode::Select));
        assert_eq!(engine.tool(), ToolMode::Select);
        assert_eq!(engine.selection(), None);
        assert!(!engine.set_tool(ToolMode::Rotate));
    }

    #[test]
    fn test_select_while_placing_cancels() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        engine.set_rotation(90).unwrap();
        engine.apply_rotation().unwrap();
        let lifted = engine.base().unwrap().clone();
        let before = engine.generation();
        let request = engine.request_commit().unwrap();

        assert!(engine.set_tool(ToolMode::Select));
        assert!(engine.fragment().is_none());
        assert_eq!(engine.rotation(), 0);
        assert!(engine.generation() > before);
        assert_eq!(engine.base(), Some(&lifted));
        assert_eq!(engine.history_len(), 1);

        let outcome = request.run();
        assert_eq!(engine.complete_decode(outcome), Ok(DecodeStatus::Stale));
        assert_eq!(engine.base(), Some(&lifted));
    }

    #[test]
    fn test_rotate_while_placing_restores_region() {
        let mut engine = engine_with(100, 100);
        let original = engine.base().unwrap().clone();
        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        engine.set_rotation(30).unwrap();
        let first = engine.apply_rotation().unwrap();
        assert_ne!(engine.base(), Some(&original));

        assert!(engine.set_tool(ToolMode::Rotate));
        assert_eq!(engine.tool(), ToolMode::Rotate);
        assert_eq!(engine.selection(), Some(Rect::new(10.0, 10.0, 40.0, 40.0)));
        assert_eq!(engine.rotation(), 30);
        assert!(engine.fragment().is_none());
        assert_eq!(engine.base(), Some(&original));
        assert_eq!(engine.history_len(), 0);

        engine.set_rotation(-45).unwrap();
        let second = engine.apply_rotation().unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.fragment().unwrap().rotation_degrees, -45);
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn test_apply_rotation_requires_rotate_mode() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        assert!(engine.set_tool(ToolMode::Select));
        engine.drain_events();

        assert_eq!(
            engine.apply_rotation(),
            Err(EngineError::InvalidToolMode("select".into()))
        );
        assert!(engine.fragment().is_none());
        assert_eq!(engine.history_len(), 0);
        assert!(matches!(
            engine.drain_events().as_slice(),
            [EngineEvent::Failed { .. }]
        ));

        assert!(engine.set_tool(ToolMode::Rotate));
        assert!(engine.apply_rotation().is_ok());
    }

    #[test]
    fn test_selection_clipped_at_raster_edge() {
        let mut engine = engine_with(200, 200);
        drag(&mut engine, (180.0, 180.0), (230.0, 230.0));
        assert_eq!(engine.selection(), Some(Rect::new(180.0, 180.0, 20.0, 20.0)));
        assert_eq!(engine.selection_size(), Some((20, 20)));
        assert_eq!(engine.tool(), ToolMode::Rotate);

        engine.apply_rotation().unwrap();
        let fragment = engine.fragment().unwrap();
        assert_eq!((fragment.width, fragment.height), (30, 30));
        assert_eq!((fragment.x, fragment.y), (175.0, 175.0));
        engine.cancel();

        // Mostly off-canvas: the on-canvas part is inside the dead zone
        engine.drain_events();
        drag(&mut engine, (196.0, 196.0), (260.0, 260.0));
        assert_eq!(engine.selection(), None);
        assert_eq!(engine.tool(), ToolMode::Select);
        assert!(engine.drain_events().is_empty());

        drag(&mut engine, (-40.0, 20.0), (30.0, 70.0));
        assert_eq!(engine.selection(), Some(Rect::new(0.0, 20.0, 30.0, 50.0)));
    }

    #[test]
    fn test_tool_mode_parse() {
        assert_eq!("rotate".parse::<ToolMode>(), Ok(ToolMode::Rotate));
        assert_eq!("Place".parse::<ToolMode>(), Ok(ToolMode::Place));
        assert!(matches!(
            "lasso".parse::<ToolMode>(),
            Err(EngineError::InvalidToolMode(_))
        ));
        assert_eq!(ToolMode::Select.to_string(), "select");
    }

    #[test]
    fn test_set_rotation() {
        let mut engine = engine_with(100, 100);
        assert_eq!(engine.set_rotation(45), Err(EngineError::InvalidSelection));

        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        assert_eq!(engine.set_rotation(270), Ok(180));
        assert_eq!(engine.set_rotation(-500), Ok(-180));
        assert_eq!(engine.set_rotation(-90), Ok(-90));

        engine.apply_rotation().unwrap();
        assert!(matches!(
            engine.set_rotation(10),
            Err(EngineError::InvalidToolMode(_))
        ));
        assert_eq!(engine.rotation(), -90);
    }

    #[test]
    fn test_rotation_resets_on_new_selection() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (50.0, 50.0));
        engine.set_rotation(30).unwrap();
        engine.set_tool(ToolMode::Select);
        drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
        assert_eq!(engine.rotation(), 0);
    }

    #[test]
    fn test_apply_rotation_without_selection() {
        let mut engine = engine_with(100, 100);
        assert_eq!(engine.apply_rotation(), Err(EngineError::InvalidSelection));
        assert_eq!(engine.history_len(), 0);
        assert!(matches!(
            engine.drain_events().as_slice(),
            [EngineEvent::Failed { .. }]
        ));
    }

    #[test]
    fn test_apply_rotation_without_image() {
        let mut engine = Engine::with_clock(EngineConfig::default(), Box::new(FixedClock(0))).unwrap();
        assert_eq!(engine.apply_rotation(), Err(EngineError::MissingSurface));
        assert!(!engine.pointer_down(Point::new(1.0, 1.0)));
        assert_eq!(engine.render_frame(), Err(EngineError::MissingSurface));
        assert_eq!(engine.export(), Err(EngineError::MissingSurface));
    }

    #[test]
    fn test_commit_without_fragment() {
        let mut engine = engine_with(100, 100);
        assert_eq!(engine.commit(), Err(EngineError::MissingFragment));
    }

    #[test]
    fn test_history_records_each_cycle() {
        let mut engine = engine_with(100, 100);
        let original = engine.base().unwrap().clone();

        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.set_rotation(45).unwrap();
        engine.apply_rotation_in_place().unwrap();
        let after_first = engine.base().unwrap().clone();

        drag(&mut engine, (50.0, 50.0), (90.0, 80.0));
        engine.set_rotation(-30).unwrap();
        engine.apply_rotation().unwrap();
        engine.commit().unwrap();
        assert_eq!(engine.history_len(), 2);

        engine.undo().unwrap();
        assert_eq!(engine.base().unwrap(), &after_first);
        engine.undo().unwrap();
        assert_eq!(engine.base().unwrap(), &original);
        assert_eq!(engine.undo(), Err(EngineError::EmptyHistory));
    }

    #[test]
    fn test_history_item_metadata() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.set_rotation(15).unwrap();
        engine.apply_rotation().unwrap();

        let item = engine.history.last().unwrap();
        assert_eq!(item.timestamp, 1_700_000_000_000);
        assert_eq!(item.rotation_degrees, 15);
    }

    #[test]
    fn test_undo_discards_pending_fragment() {
        let mut engine = engine_with(100, 100);
        let original = engine.base().unwrap().clone();
        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.apply_rotation().unwrap();

        engine.undo().unwrap();
        assert!(engine.fragment().is_none());
        assert_eq!(engine.tool(), ToolMode::Select);
        assert_eq!(engine.base().unwrap(), &original);
    }

    #[test]
    fn test_load_clears_everything() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.apply_rotation().unwrap();

        let generation = engine.generation();
        engine.load_image(pattern(30, 30)).unwrap();
        assert!(engine.generation() > generation);
        assert_eq!(engine.history_len(), 0);
        assert_eq!(engine.tool(), ToolMode::Select);
        assert_eq!(engine.layout(), CanvasLayout::unscaled(30, 30));
        assert_eq!(engine.base().unwrap().width, 30);
    }

    #[test]
    fn test_load_image_bytes() {
        let mut engine = Engine::with_clock(EngineConfig::default(), Box::new(FixedClock(0))).unwrap();
        let png = encode_png(&pattern(12, 7)).unwrap();
        engine.load_image_bytes(&png).unwrap();
        assert_eq!(engine.base().unwrap(), &pattern(12, 7));

        assert!(matches!(
            engine.load_image_bytes(b"not an image"),
            Err(EngineError::DecodeFailure(_))
        ));
        // Failed load keeps the previous image
        assert!(engine.has_image());
    }

    #[test]
    fn test_load_empty_raster_rejected() {
        let mut engine = engine_with(10, 10);
        let result = engine.load_image(Raster::new(0, 0, vec![]));
        assert!(matches!(result, Err(EngineError::DecodeFailure(_))));
        assert!(engine.has_image());
    }

    #[test]
    fn test_reset() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.reset();
        assert!(!engine.has_image());
        assert_eq!(engine.selection(), None);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_redraw_flag() {
        let mut engine = engine_with(100, 100);
        assert!(!engine.take_redraw());

        engine.pointer_down(Point::new(10.0, 10.0));
        assert!(engine.take_redraw());
        assert!(!engine.take_redraw());

        engine.pointer_move(Point::new(30.0, 30.0));
        assert!(engine.take_redraw());
    }

    #[test]
    fn test_render_frame_overlays() {
        let mut engine = engine_with(100, 100);
        let plain = engine.render_frame().unwrap();
        assert_eq!(&plain, engine.base().unwrap());

        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        let with_selection = engine.render_frame().unwrap();
        assert_ne!(&with_selection, engine.base().unwrap());

        engine.apply_rotation().unwrap();
        let with_fragment = engine.render_frame().unwrap();
        assert_ne!(&with_fragment, engine.base().unwrap());
    }

    #[test]
    fn test_export_and_file_name() {
        let engine = engine_with(16, 16);
        let png = engine.export().unwrap();
        assert_eq!(&decode_png(&png).unwrap(), engine.base().unwrap());
        assert_eq!(engine.export_file_name(), "rotated-image-1700000000000.png");
        assert_eq!(
            export_file_name(5, ExportFormat::Jpeg { quality: 80 }),
            "rotated-image-5.jpg"
        );
        assert!(!engine.export_as(ExportFormat::Jpeg { quality: 80 }).unwrap().is_empty());
    }

    #[test]
    fn test_events_serialize_with_kind() {
        let mut engine = engine_with(100, 100);
        drag(&mut engine, (10.0, 10.0), (40.0, 40.0));
        engine.apply_rotation().unwrap();

        let events = engine.drain_events();
        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(json[0]["kind"], "selection-ready");
        assert_eq!(json[0]["selection"]["width"], 30.0);
        assert_eq!(json[1]["kind"], "rotation-applied");
        assert_eq!(json[1]["rotationDegrees"], 0);
        assert_eq!(json[1]["fragmentId"], 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.fragment_scale = 1.0;
        assert!(Engine::new(config).is_err());
    }
}

// ============================================================================
// Property-based tests
// ============================================================================
