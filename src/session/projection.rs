//! Projections pushed to external observers on every state transition.

use std::path::PathBuf;
use std::time::Duration;

use crate::library::Track;
use crate::notification::NotificationView;

use super::types::PlaybackIntent;

/// Metadata of the current track as published to the OS media session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub track_id: u64,
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    pub path: PathBuf,
}

impl MediaMetadata {
    pub fn from_track(track: &Track) -> Self {
        Self {
            track_id: track.id,
            title: track.title.clone(),
            artist: track.artist.clone(),
            duration: track.duration,
            path: track.path.clone(),
        }
    }
}

/// Play/pause state plus the position at the time of the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub intent: PlaybackIntent,
    pub position: Duration,
}

/// Receiver of the three derived projections.
///
/// The session calls every hook, in declaration order, after each
/// transition; implementations pick the ones they render.
pub trait SessionObserver {
    /// `None` when the playlist has no current track.
    fn on_metadata(&mut self, _metadata: Option<&MediaMetadata>) {}
    fn on_playback_state(&mut self, _status: &PlaybackStatus) {}
    fn on_notification(&mut self, _view: &NotificationView) {}
}
