//! Application model: `App` and the navigation helpers it is built on.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::library::Track;
use crate::session::{SessionCmd, SessionSnapshot};

const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    until: Instant,
}

/// The main application model.
pub struct App {
    /// Catalog in scan order.
    pub tracks: Vec<Track>,
    /// Display order as indices into `tracks`; a permutation while shuffled.
    order: Vec<usize>,
    /// Selected position within the displayed list.
    pub selected: usize,
    pub shuffle: bool,
    /// Last snapshot pulled from the session.
    pub now: SessionSnapshot,
    pub current_dir: Option<String>,
    pub metadata_window: bool,
    pub should_quit: bool,
    notice: Option<Notice>,
    notice_ttl: Duration,
}

impl App {
    pub fn new(tracks: Vec<Track>) -> Self {
        let order = (0..tracks.len()).collect();
        Self {
            tracks,
            order,
            selected: 0,
            shuffle: false,
            now: SessionSnapshot::default(),
            current_dir: None,
            metadata_window: false,
            should_quit: false,
            notice: None,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn set_notice_ttl(&mut self, ttl: Duration) {
        self.notice_ttl = ttl;
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Tracks in displayed order.
    pub fn displayed(&self) -> Vec<&Track> {
        self.order.iter().map(|&i| &self.tracks[i]).collect()
    }

    /// Copy of the displayed list, the playlist handed to the session.
    pub fn playlist(&self) -> Vec<Track> {
        self.order.iter().map(|&i| self.tracks[i].clone()).collect()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.order.get(self.selected).map(|&i| &self.tracks[i])
    }

    /// Displayed position of the session's current track, found by path.
    pub fn playing_position(&self) -> Option<usize> {
        let current = self.now.current_track.as_ref()?;
        self.order
            .iter()
            .position(|&i| self.tracks[i].same_source(current))
    }

    /// Replace the session playlist with the displayed list.
    pub fn sync_playlist(&self) -> SessionCmd {
        SessionCmd::SetPlaylist(self.playlist())
    }

    pub fn pull(&mut self, snapshot: SessionSnapshot) {
        self.now = snapshot;
    }

    // -- user intents --------------------------------------------------

    /// Play the selected row. Display positions index the session playlist
    /// directly: every change to `order` must go out through `sync_playlist`.
    pub fn activate_selected(&mut self) -> Vec<SessionCmd> {
        if self.order.is_empty() {
            return Vec::new();
        }
        vec![SessionCmd::PlayAt(self.selected as isize)]
    }

    pub fn play(&mut self) -> Vec<SessionCmd> {
        vec![SessionCmd::Play]
    }

    pub fn pause(&mut self) -> Vec<SessionCmd> {
        vec![SessionCmd::Pause]
    }

    pub fn play_pause(&mut self) -> Vec<SessionCmd> {
        if self.now.is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    pub fn next(&mut self) -> Vec<SessionCmd> {
        vec![SessionCmd::Next]
    }

    /// Step back in the displayed list, located by the current track's path.
    pub fn previous(&mut self) -> Vec<SessionCmd> {
        let displayed = self.playlist();
        match previous_target(&displayed, self.now.current_track.as_ref()) {
            Some(target) => vec![SessionCmd::PlayAt(target as isize)],
            None => Vec::new(),
        }
    }

    /// Flip shuffle, hand the session the reordered (or restored) list and
    /// restart at its first track.
    pub fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<SessionCmd> {
        let set = self.set_shuffle(!self.shuffle, rng);
        vec![set, SessionCmd::PlayAt(0)]
    }

    /// Reorder the displayed list without starting playback.
    pub fn set_shuffle<R: Rng + ?Sized>(&mut self, on: bool, rng: &mut R) -> SessionCmd {
        self.shuffle = on;
        self.order = (0..self.tracks.len()).collect();
        if on {
            self.order.shuffle(rng);
        }
        self.selected = 0;
        debug!(shuffle = on, "display order changed");
        self.sync_playlist()
    }

    /// Relative seek from the last known position, floored at zero and
    /// capped at the track's duration when it is known.
    pub fn seek_by(&mut self, delta_ms: i64) -> Vec<SessionCmd> {
        if self.now.current_track.is_none() {
            return Vec::new();
        }
        let current = self.now.position.as_millis() as i64;
        let mut target = current.saturating_add(delta_ms).max(0) as u64;
        if !self.now.duration.is_zero() {
            target = target.min(self.now.duration.as_millis() as u64);
        }
        vec![SessionCmd::SeekTo(Duration::from_millis(target))]
    }

    pub fn seek_to(&mut self, position: Duration) -> Vec<SessionCmd> {
        vec![SessionCmd::SeekTo(position)]
    }

    /// Handle an "open this file" request: play the requested track, or
    /// the first track when it is not part of the catalog.
    pub fn open_request(&mut self, path: &Path) -> Vec<SessionCmd> {
        if self.order.is_empty() {
            warn!(path = %path.display(), "open request with empty library");
            return Vec::new();
        }
        let displayed = self.playlist();
        if locate(&displayed, path).is_none() {
            warn!(path = %path.display(), "requested file is not in the library");
            self.set_notice(format!("Not in library: {}", path.display()), Instant::now());
        }
        let target = resolve_open_request(&displayed, path);
        self.selected = target;
        vec![SessionCmd::PlayAt(target as isize)]
    }

    /// Content action of the notification: reveal the playing track.
    pub fn raise(&mut self) {
        self.metadata_window = false;
        if let Some(pos) = self.playing_position() {
            self.selected = pos;
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    // -- selection -----------------------------------------------------

    pub fn select_next(&mut self) {
        if !self.order.is_empty() {
            self.selected = (self.selected + 1) % self.order.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.order.is_empty() {
            self.selected = (self.selected + self.order.len() - 1) % self.order.len();
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.order.len().saturating_sub(1);
    }

    // -- notices -------------------------------------------------------

    pub fn set_notice(&mut self, text: String, now: Instant) {
        self.notice = Some(Notice {
            text,
            until: now + self.notice_ttl,
        });
    }

    /// The notice to show at `now`, if it has not expired.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| now < n.until)
            .map(|n| n.text.as_str())
    }

    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| now >= n.until) {
            self.notice = None;
        }
    }
}

/// Index to play for "previous" in `displayed`.
///
/// The current track is located by path; found at `i` the target is
/// `i - 1` with wraparound, not found restarts at the last entry. `None`
/// only for an empty list.
pub fn previous_target(displayed: &[Track], current: Option<&Track>) -> Option<usize> {
    if displayed.is_empty() {
        return None;
    }
    let len = displayed.len();
    let found = current.and_then(|c| displayed.iter().position(|t| t.same_source(c)));
    Some(match found {
        Some(i) => (i + len - 1) % len,
        None => len - 1,
    })
}

/// Index in `tracks` of the file `path`. Falls back to 0 when the file is
/// not in the list.
pub fn resolve_open_request(tracks: &[Track], path: &Path) -> usize {
    locate(tracks, path).unwrap_or(0)
}

fn locate(tracks: &[Track], path: &Path) -> Option<usize> {
    if let Some(i) = tracks.iter().position(|t| t.is_at(path)) {
        return Some(i);
    }
    let wanted = canonical(path);
    tracks.iter().position(|t| canonical(&t.path) == wanted)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
