//! In-memory engine and recording observer for session tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::{EngineError, PlaybackEngine};
use crate::library::Track;
use crate::notification::NotificationView;

use super::projection::{MediaMetadata, PlaybackStatus, SessionObserver};
use super::types::PlaybackIntent;

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub loaded: Option<PathBuf>,
    pub started: bool,
    pub paused: bool,
    pub finished: bool,
    pub position: Duration,
    pub duration: Duration,
    pub durations: HashMap<PathBuf, Duration>,
    pub missing: HashSet<PathBuf>,
    pub loads: Vec<PathBuf>,
    pub releases: usize,
    pub max_live: usize,
}

/// Engine whose state lives behind a shared handle so tests can inspect and
/// drive it after the session takes ownership.
#[derive(Clone, Default)]
pub(crate) struct FakeEngine {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().missing.insert(path.into());
    }

    /// Let `by` of playback elapse if the engine is running.
    pub fn advance(&self, by: Duration) {
        let mut s = self.state.lock().unwrap();
        if s.loaded.is_some() && s.started && !s.paused {
            s.position = (s.position + by).min(s.duration);
            if s.position >= s.duration {
                s.finished = true;
            }
        }
    }

    pub fn finish(&self) {
        let mut s = self.state.lock().unwrap();
        s.position = s.duration;
        s.finished = true;
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn loaded(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().loaded.clone()
    }
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, source: &Path) -> Result<(), EngineError> {
        let mut s = self.state.lock().unwrap();
        s.loads.push(source.to_path_buf());
        if s.missing.contains(source) {
            return Err(EngineError::NotFound(source.to_path_buf()));
        }
        // A second live resource would leak the first.
        let live = usize::from(s.loaded.is_some()) + 1;
        s.max_live = s.max_live.max(live);

        s.duration = s
            .durations
            .get(source)
            .copied()
            .unwrap_or(Duration::from_secs(180));
        s.loaded = Some(source.to_path_buf());
        s.started = false;
        s.paused = true;
        s.finished = false;
        s.position = Duration::ZERO;
        Ok(())
    }

    fn start(&mut self) {
        let mut s = self.state.lock().unwrap();
        if s.loaded.is_some() {
            s.started = true;
            s.paused = false;
        }
    }

    fn pause(&mut self) {
        let mut s = self.state.lock().unwrap();
        if s.loaded.is_some() {
            s.paused = true;
        }
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        let mut s = self.state.lock().unwrap();
        if s.loaded.is_none() {
            return Err(EngineError::NotLoaded);
        }
        s.position = position.min(s.duration);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> Duration {
        let s = self.state.lock().unwrap();
        if s.loaded.is_some() {
            s.duration
        } else {
            Duration::ZERO
        }
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().unwrap().loaded.is_some()
    }

    fn is_playing(&self) -> bool {
        let s = self.state.lock().unwrap();
        s.loaded.is_some() && s.started && !s.paused && !s.finished
    }

    fn is_finished(&self) -> bool {
        let s = self.state.lock().unwrap();
        s.loaded.is_some() && s.started && s.finished
    }

    fn release(&mut self) {
        let mut s = self.state.lock().unwrap();
        if s.loaded.take().is_some() {
            s.releases += 1;
        }
        s.started = false;
        s.paused = false;
        s.finished = false;
        s.position = Duration::ZERO;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Projected {
    Metadata(Option<MediaMetadata>),
    State(PlaybackIntent),
    Notification { title: String, is_playing: bool },
}

#[derive(Clone, Default)]
pub(crate) struct RecordingObserver {
    pub events: Arc<Mutex<Vec<Projected>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Projected> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_title(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            Projected::Metadata(m) => Some(m.map(|m| m.title).unwrap_or_default()),
            _ => None,
        })
    }
}

impl SessionObserver for RecordingObserver {
    fn on_metadata(&mut self, metadata: Option<&MediaMetadata>) {
        self.events
            .lock()
            .unwrap()
            .push(Projected::Metadata(metadata.cloned()));
    }

    fn on_playback_state(&mut self, status: &PlaybackStatus) {
        self.events
            .lock()
            .unwrap()
            .push(Projected::State(status.intent));
    }

    fn on_notification(&mut self, view: &NotificationView) {
        self.events.lock().unwrap().push(Projected::Notification {
            title: view.title.clone(),
            is_playing: view.is_playing,
        });
    }
}

pub(crate) fn track(id: u64, title: &str) -> Track {
    Track {
        id,
        title: title.to_string(),
        artist: format!("{title} Artist"),
        duration: Duration::from_secs(180),
        path: PathBuf::from(format!("/music/{title}.mp3")),
        display: title.to_string(),
    }
}

pub(crate) fn abc() -> Vec<Track> {
    vec![track(1, "A"), track(2, "B"), track(3, "C")]
}
