//! Application module: the presentation model used by the TUI and runtime.
//!
//! `App` (in `app::model`) holds the catalog, the displayed order and the
//! last session snapshot. Every user intent is turned into session commands
//! here; the runtime sends them and pulls a fresh snapshot afterwards.

mod control;
mod model;

pub use control::ControlCmd;
pub use model::*;
