//! Engine configuration constants
//!
//! Central location for canvas geometry, interaction tuning, and
//! archive format identifiers used throughout the engine.

// ===== Canvas Grid =====

/// Grid unit in logical pixels. Committed drag positions snap to
/// multiples of this value; must match the background grid rendered
/// by the UI shell.
pub const GRID_SIZE: f64 = 20.0;

/// Initial logical canvas size in pixels (both axes)
pub const CANVAS_DEFAULT_SIZE: f64 = 3000.0;

/// The canvas grows whenever an element lands within this margin of
/// the right or bottom edge.
pub const CANVAS_GROW_MARGIN: f64 = 500.0;

// ===== Element Dimensions =====

/// Default width for a freshly created text box in logical pixels
pub const TEXT_DEFAULT_WIDTH: f64 = 300.0;
/// Default height for a freshly created text box in logical pixels
pub const TEXT_DEFAULT_HEIGHT: f64 = 100.0;
/// Minimum width a text box can be resized to
pub const TEXT_MIN_WIDTH: f64 = 150.0;
/// Minimum height a text box can be resized to
pub const TEXT_MIN_HEIGHT: f64 = 50.0;
/// Minimum width an image can be resized to
pub const IMAGE_MIN_WIDTH: f64 = 100.0;
/// Minimum height an image can be resized to
pub const IMAGE_MIN_HEIGHT: f64 = 100.0;

/// Horizontal offset from a canvas click to the top-left corner of the
/// pending text cursor, so the default text box centers on the click.
pub const PENDING_CURSOR_OFFSET_X: f64 = 150.0;
/// Vertical offset from a canvas click to the pending text cursor
pub const PENDING_CURSOR_OFFSET_Y: f64 = 50.0;

// ===== Persistence Tuning =====

/// Quiet period for debounced rich-text content saves in milliseconds.
/// Only the most recent pending write survives the debounce window.
pub const CONTENT_SAVE_DEBOUNCE_MS: u64 = 500;

// ===== Archive Formats =====

/// Format tag for a full multi-notebook backup (`.mrnote`)
pub const ARCHIVE_FORMAT_FULL: &str = "MRNotes";
/// Format tag for a single-notebook export (`.mrbook`)
pub const ARCHIVE_FORMAT_NOTEBOOK: &str = "MRBook";
/// Archive format version written into every export
pub const ARCHIVE_VERSION: &str = "1.0.0";

/// File extension for full backups
pub const EXT_FULL_BACKUP: &str = "mrnote";
/// File extension for single-notebook exports
pub const EXT_NOTEBOOK: &str = "mrbook";
/// File extension for plain Markdown pages
pub const EXT_MARKDOWN: &str = "md";

// ===== Notebook Defaults =====

/// Display color assigned to notebooks created without one
pub const NOTEBOOK_DEFAULT_COLOR: &str = "#2563eb";
/// Display icon assigned to notebooks created without one
pub const NOTEBOOK_DEFAULT_ICON: &str = "book";

/// Color for tags created without an explicit one (archive imports
/// whose tag table misses a referenced name)
pub const TAG_DEFAULT_COLOR: &str = "#64748b";
