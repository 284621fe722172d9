use std::time::Duration;

use crate::session::SessionCmd;

use super::model::App;

/// Commands arriving from outside the key handler: MPRIS and the
/// notification buttons.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Next,
    Prev,
    /// Relative seek in milliseconds.
    SeekBy(i64),
    SetPosition(Duration),
    /// Bring the player to the foreground.
    Raise,
}

impl App {
    /// Translate an external control command into session commands.
    pub fn control(&mut self, cmd: ControlCmd) -> Vec<SessionCmd> {
        match cmd {
            ControlCmd::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            ControlCmd::Play => self.play(),
            ControlCmd::Pause => self.pause(),
            ControlCmd::PlayPause => self.play_pause(),
            ControlCmd::Next => self.next(),
            ControlCmd::Prev => self.previous(),
            ControlCmd::SeekBy(delta_ms) => self.seek_by(delta_ms),
            ControlCmd::SetPosition(position) => self.seek_to(position),
            ControlCmd::Raise => {
                self.raise();
                Vec::new()
            }
        }
    }
}
