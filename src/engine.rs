//! Playback engine: a single-track decode/output resource.
//!
//! The session drives an engine through the [`PlaybackEngine`] trait. The
//! production backend is [`RodioEngine`]; tests use an in-memory engine.

mod output;
mod sink;
mod types;

pub use output::RodioEngine;
pub use types::{EngineError, PlaybackEngine};
