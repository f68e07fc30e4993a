//! MRNotes core engine
//!
//! Local-first storage, canvas element engine, and archive codec for a
//! OneNote-style note-taking application. The UI shell consumes this
//! library; no window or rendering code lives here.

pub mod archive;
pub mod canvas;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and examples embedding the engine.
///
/// Reads `RUST_LOG` for filtering, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
