use std::time::Duration;

use crate::library::Track;

/// Desired state of the playback engine, kept in sync with the engine after
/// every session operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackIntent {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// User intents accepted by the session's control thread.
#[derive(Debug, Clone)]
pub enum SessionCmd {
    /// Replace the playlist with a private copy of these tracks.
    SetPlaylist(Vec<Track>),
    /// Select and start the track at this index (clamped into range).
    PlayAt(isize),
    Play,
    Pause,
    Next,
    SeekTo(Duration),
    /// Release the engine and stop the control thread.
    Shutdown,
}

/// Read-only view of the session computed on demand for presentation.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub cursor: Option<usize>,
    pub position: Duration,
    pub duration: Duration,
    pub is_playing: bool,
    pub intent: PlaybackIntent,
}
