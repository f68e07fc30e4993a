//! Canvas element engine
//!
//! Owns the in-memory representation of a page's freeform elements,
//! the grid/z-order logic, and the drag/resize/click-to-create
//! interaction state machines consumed by the UI shell.

pub mod engine;
pub mod gesture;
pub mod grid;

pub use engine::{CanvasEngine, CanvasSize, PendingCursor};
pub use gesture::{DragGesture, DragMode, ResizeGesture};
pub use grid::{clamp_origin, snap_to_grid};
