//! Drag and resize gestures
//!
//! Small state machines fed by pointer events from the UI shell. Text
//! elements track the pointer live through the engine; image and file
//! elements accumulate a visual offset and commit once on release so
//! the grid snap never fights the pointer mid-drag.

use crate::canvas::engine::CanvasEngine;
use crate::canvas::grid::snap_to_grid;
use crate::database::ElementKind;
use tokio::task::JoinHandle;

/// How a drag applies its updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Every pointer move updates the element position (text)
    Live,
    /// Moves accumulate a visual offset, committed on release
    /// (image, file)
    Deferred,
}

impl DragMode {
    pub fn for_kind(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Text => DragMode::Live,
            ElementKind::Image | ElementKind::File => DragMode::Deferred,
        }
    }
}

/// An in-progress element drag
#[derive(Debug)]
pub struct DragGesture {
    element_id: String,
    mode: DragMode,
    /// Pointer position relative to the element origin at grab time
    grab_offset: (f64, f64),
    origin: (f64, f64),
    visual_offset: (f64, f64),
}

impl DragGesture {
    /// Begin dragging the element under the pointer.
    ///
    /// `pointer` is in canvas-local coordinates. Returns `None` when
    /// the element no longer exists.
    pub fn begin(engine: &CanvasEngine, element_id: &str, pointer: (f64, f64)) -> Option<Self> {
        let element = engine.element(element_id)?;
        let mode = DragMode::for_kind(element.element_kind()?);

        Some(Self {
            element_id: element_id.to_string(),
            mode,
            grab_offset: (
                pointer.0 - element.position_x,
                pointer.1 - element.position_y,
            ),
            origin: (element.position_x, element.position_y),
            visual_offset: (0.0, 0.0),
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    /// Offset to apply to the element while the drag is in flight.
    /// Always zero in live mode.
    pub fn visual_offset(&self) -> (f64, f64) {
        self.visual_offset
    }

    /// Target position for the current pointer, before snapping
    fn target(&self, pointer: (f64, f64)) -> (f64, f64) {
        (pointer.0 - self.grab_offset.0, pointer.1 - self.grab_offset.1)
    }

    /// Feed a pointer move.
    ///
    /// In live mode this writes through the engine (snapped); the
    /// returned handle is the background persistence task. In deferred
    /// mode only the visual offset changes and nothing persists.
    pub fn pointer_move(
        &mut self,
        engine: &mut CanvasEngine,
        pointer: (f64, f64),
    ) -> Option<JoinHandle<()>> {
        let (x, y) = self.target(pointer);

        match self.mode {
            DragMode::Live => engine.move_element(&self.element_id, x, y, false),
            DragMode::Deferred => {
                self.visual_offset = (x - self.origin.0, y - self.origin.1);
                None
            }
        }
    }

    /// Release the drag, committing the final position.
    ///
    /// `alt_held` bypasses grid snapping for free placement.
    pub fn pointer_up(
        self,
        engine: &mut CanvasEngine,
        pointer: (f64, f64),
        alt_held: bool,
    ) -> Option<JoinHandle<()>> {
        let (x, y) = self.target(pointer);
        engine.move_element(&self.element_id, x, y, alt_held)
    }
}

/// An in-progress resize from an element's corner handle
#[derive(Debug)]
pub struct ResizeGesture {
    element_id: String,
    start_pointer: (f64, f64),
    start_size: (f64, f64),
    min: (f64, f64),
}

impl ResizeGesture {
    /// Begin resizing. Returns `None` for elements that are not
    /// resizable (file cards) or no longer exist.
    pub fn begin(engine: &CanvasEngine, element_id: &str, pointer: (f64, f64)) -> Option<Self> {
        let element = engine.element(element_id)?;
        let min = element.element_kind()?.min_size()?;

        Some(Self {
            element_id: element_id.to_string(),
            start_pointer: pointer,
            start_size: (element.width, element.height),
            min,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Size for the current pointer, snapped and clamped to the
    /// element type's minimum
    fn target(&self, pointer: (f64, f64)) -> (f64, f64) {
        let width = self.start_size.0 + (pointer.0 - self.start_pointer.0);
        let height = self.start_size.1 + (pointer.1 - self.start_pointer.1);
        (
            snap_to_grid(width).max(self.min.0),
            snap_to_grid(height).max(self.min.1),
        )
    }

    /// Feed a pointer move; resizes live through the engine
    pub fn pointer_move(
        &mut self,
        engine: &mut CanvasEngine,
        pointer: (f64, f64),
    ) -> Option<JoinHandle<()>> {
        let (width, height) = self.target(pointer);
        engine.resize_element(&self.element_id, width, height)
    }
}
