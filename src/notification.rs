//! Persistent now-playing notification.
//!
//! The view is rebuilt by the session after every transition and rendered by
//! the terminal UI as a panel that survives while the app is in the
//! background list view. Its buttons map onto the same control commands as
//! the OS media session.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::app::ControlCmd;
use crate::library::Track;
use crate::session::SessionObserver;


pub const NO_SONG: &str = "No song";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    Previous,
    Play,
    Pause,
    Next,
    /// Tapping the notification body: bring the app to the foreground.
    Open,
}

impl NotificationAction {
    pub fn label(self) -> &'static str {
        match self {
            NotificationAction::Previous => "Prev",
            NotificationAction::Play => "Play",
            NotificationAction::Pause => "Pause",
            NotificationAction::Next => "Next",
            NotificationAction::Open => "Open",
        }
    }

    pub fn command(self) -> ControlCmd {
        match self {
            NotificationAction::Previous => ControlCmd::Prev,
            NotificationAction::Play => ControlCmd::Play,
            NotificationAction::Pause => ControlCmd::Pause,
            NotificationAction::Next => ControlCmd::Next,
            NotificationAction::Open => ControlCmd::Raise,
        }
    }
}

/// What the notification shows: title, artist and three action buttons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationView {
    pub title: String,
    pub text: String,
    pub is_playing: bool,
    pub actions: [NotificationAction; 3],
    pub content: NotificationAction,
}

impl NotificationView {
    pub fn build(track: Option<&Track>, is_playing: bool) -> Self {
        let (title, text) = match track {
            Some(t) => (t.title.clone(), t.artist.clone()),
            None => (NO_SONG.to_string(), String::new()),
        };
        let toggle = if is_playing {
            NotificationAction::Pause
        } else {
            NotificationAction::Play
        };

        Self {
            title,
            text,
            is_playing,
            actions: [NotificationAction::Previous, toggle, NotificationAction::Next],
            content: NotificationAction::Open,
        }
    }

    /// The single button shown in the collapsed form.
    pub fn compact_action(&self) -> NotificationAction {
        self.actions[1]
    }
}

impl Default for NotificationView {
    fn default() -> Self {
        Self::build(None, false)
    }
}

#[derive(Debug, Default)]
struct CenterState {
    view: NotificationView,
    renders: usize,
}

/// Shared holder of the latest notification, written by the session's
/// control thread and read by the UI.
#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    inner: Arc<Mutex<CenterState>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> NotificationView {
        self.inner
            .lock()
            .map(|s| s.view.clone())
            .unwrap_or_default()
    }

    /// Number of times the view was (re)published.
    pub fn renders(&self) -> usize {
        self.inner.lock().map(|s| s.renders).unwrap_or(0)
    }

    /// Command for the button at `index` (0-based), if any.
    pub fn dispatch(&self, index: usize) -> Option<ControlCmd> {
        let action = self.current().actions.get(index).copied()?;
        debug!(?action, "notification button");
        Some(action.command())
    }

    /// Command for tapping the notification body.
    pub fn open(&self) -> ControlCmd {
        self.current().content.command()
    }
}

impl SessionObserver for NotificationCenter {
    fn on_notification(&mut self, view: &NotificationView) {
        if let Ok(mut s) = self.inner.lock() {
            s.view = view.clone();
            s.renders += 1;
        }
    }
}
