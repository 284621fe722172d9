use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::engine::PlaybackEngine;
use crate::library::Track;
use crate::notification::NotificationView;

use super::projection::{MediaMetadata, PlaybackStatus, SessionObserver};
use super::types::{PlaybackIntent, SessionCmd, SessionSnapshot};

/// The playback state machine.
///
/// States: idle (empty playlist or nothing loaded), loaded-paused and
/// loaded-playing. The session exclusively owns its engine and never holds
/// more than one loaded resource: every reload releases the previous one
/// first. It has no internal locking; callers serialize access (see
/// [`SessionHandle`](super::SessionHandle)).
pub struct PlaybackSession<E> {
    engine: E,
    playlist: Vec<Track>,
    cursor: Option<usize>,
    intent: PlaybackIntent,
    observers: Vec<Box<dyn SessionObserver + Send>>,
    notices: VecDeque<String>,
}

impl<E: PlaybackEngine> PlaybackSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            playlist: Vec::new(),
            cursor: None,
            intent: PlaybackIntent::Stopped,
            observers: Vec::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver + Send>) {
        self.observers.push(observer);
    }

    /// Replace the playlist with a private copy of `tracks`.
    ///
    /// Neither the cursor nor the engine change; callers follow up with
    /// [`play_at`](Self::play_at). An empty playlist unsets the cursor.
    pub fn set_playlist(&mut self, tracks: &[Track]) {
        self.playlist = tracks.to_vec();
        if self.playlist.is_empty() {
            self.cursor = None;
        }
        debug!(len = self.playlist.len(), cursor = ?self.cursor, "playlist replaced");
    }

    /// Select `index` (clamped into the playlist) and start it from the top.
    ///
    /// No-op on an empty playlist. Load failures are logged and queued as a
    /// notice; they never reach the caller and never auto-advance.
    pub fn play_at(&mut self, index: isize) {
        if self.playlist.is_empty() {
            debug!(index, "play_at ignored: empty playlist");
            return;
        }
        let last = self.playlist.len() as isize - 1;
        let clamped = index.clamp(0, last) as usize;
        self.cursor = Some(clamped);
        self.reload_and_start();
    }

    /// Resume the loaded track, or load the track at the cursor when nothing
    /// is loaded yet.
    pub fn play(&mut self) {
        if !self.engine.is_loaded() {
            if self.playlist.is_empty() {
                debug!("play ignored: empty playlist");
                return;
            }
            let index = self.cursor.unwrap_or(0);
            self.play_at(index as isize);
            return;
        }

        if self.engine.is_playing() {
            return;
        }
        self.engine.start();
        self.intent = PlaybackIntent::Playing;
        debug!(position = ?self.engine.position(), "resumed");
        self.refresh_projections();
    }

    /// Suspend output and keep the position. No-op unless playing.
    pub fn pause(&mut self) {
        if !self.engine.is_playing() {
            return;
        }
        self.engine.pause();
        self.intent = PlaybackIntent::Paused;
        debug!(position = ?self.engine.position(), "paused");
        self.refresh_projections();
    }

    /// Advance the cursor by one with wraparound and start that track.
    ///
    /// From an unset cursor this starts the first track.
    pub fn next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let next = match self.cursor {
            Some(c) => (c + 1) % self.playlist.len(),
            None => 0,
        };
        self.cursor = Some(next);
        self.reload_and_start();
    }

    /// Natural end of the current track reported by the engine.
    pub fn on_track_finished(&mut self) {
        debug!(cursor = ?self.cursor, "track finished");
        self.next();
    }

    /// Forward a seek to the engine, which clamps to `[0, duration]`.
    pub fn seek_to(&mut self, position: Duration) {
        if !self.engine.is_loaded() {
            return;
        }
        if let Err(e) = self.engine.seek(position) {
            warn!(?position, error = %e, "seek failed");
        }
        self.refresh_projections();
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.playlist.get(c))
    }

    pub fn current_position(&self) -> Duration {
        if self.engine.is_loaded() {
            self.engine.position()
        } else {
            Duration::ZERO
        }
    }

    pub fn duration(&self) -> Duration {
        if self.engine.is_loaded() {
            self.engine.duration()
        } else {
            Duration::ZERO
        }
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_loaded() && self.engine.is_playing()
    }

    pub fn intent(&self) -> PlaybackIntent {
        self.intent
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    /// True when the engine reports the loaded track has drained.
    pub fn engine_finished(&self) -> bool {
        self.engine.is_loaded() && self.engine.is_finished()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current_track().cloned(),
            cursor: self.cursor,
            position: self.current_position(),
            duration: self.duration(),
            is_playing: self.is_playing(),
            intent: self.intent,
        }
    }

    /// Pop the oldest user-visible failure message.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notices.pop_front()
    }

    pub fn apply(&mut self, cmd: SessionCmd) {
        match cmd {
            SessionCmd::SetPlaylist(tracks) => self.set_playlist(&tracks),
            SessionCmd::PlayAt(index) => self.play_at(index),
            SessionCmd::Play => self.play(),
            SessionCmd::Pause => self.pause(),
            SessionCmd::Next => self.next(),
            SessionCmd::SeekTo(position) => self.seek_to(position),
            SessionCmd::Shutdown => self.shutdown(),
        }
    }

    /// Release the engine and publish the stopped state.
    pub fn shutdown(&mut self) {
        self.engine.release();
        self.intent = PlaybackIntent::Stopped;
        info!("session shut down");
        self.refresh_projections();
    }

    fn reload_and_start(&mut self) {
        let Some(track) = self.current_track().cloned() else {
            return;
        };

        self.engine.release();
        match self.engine.load(&track.path) {
            Ok(()) => {
                self.engine.start();
                self.intent = PlaybackIntent::Playing;
                info!(id = track.id, title = %track.title, cursor = ?self.cursor, "playing");
                self.refresh_projections();
            }
            Err(e) => {
                // Observers keep the pre-call projection.
                self.engine.release();
                self.intent = PlaybackIntent::Stopped;
                error!(path = %track.path.display(), error = %e, "failed to load track");
                self.notices
                    .push_back(format!("Cannot play {}: {e}", track.title));
            }
        }
    }

    fn refresh_projections(&mut self) {
        let metadata = self.current_track().map(MediaMetadata::from_track);
        let status = PlaybackStatus {
            intent: self.intent,
            position: self.current_position(),
        };
        let view = NotificationView::build(self.current_track(), self.is_playing());

        for observer in &mut self.observers {
            observer.on_metadata(metadata.as_ref());
            observer.on_playback_state(&status);
            observer.on_notification(&view);
        }
    }
}
