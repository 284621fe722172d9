//! Engine trait and error type.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("source file {0} does not exist")]
    NotFound(PathBuf),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("seek failed: {0}")]
    Seek(#[from] rodio::source::SeekError),
    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("no track loaded")]
    NotLoaded,
}

/// A decode/output resource holding at most one loaded track.
///
/// `load` acquires a new resource and leaves it paused; callers release the
/// previous one first. All position and duration values are zero while
/// nothing is loaded.
pub trait PlaybackEngine {
    fn load(&mut self, source: &Path) -> Result<(), EngineError>;
    fn start(&mut self);
    fn pause(&mut self);
    /// Seek within the loaded track, clamped to `[0, duration]`.
    fn seek(&mut self, position: Duration) -> Result<(), EngineError>;
    fn position(&self) -> Duration;
    fn duration(&self) -> Duration;
    fn is_loaded(&self) -> bool;
    fn is_playing(&self) -> bool;
    /// True once a started track has played to its natural end.
    fn is_finished(&self) -> bool;
    fn release(&mut self);
}
