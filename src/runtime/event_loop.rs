use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{App, ControlCmd};
use crate::config;
use crate::mpris::MprisHandle;
use crate::notification::NotificationCenter;
use crate::session::{SessionCmd, SessionHandle, SessionSnapshot};
use crate::ui;

/// Upper bound on how long an intent waits for the control thread.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Everything the loop reads from besides the keyboard.
pub struct Inputs<'a> {
    pub session: &'a SessionHandle,
    pub notification: &'a NotificationCenter,
    pub mpris: &'a MprisHandle,
    pub control_rx: &'a Receiver<ControlCmd>,
    pub snapshot_rx: &'a Receiver<SessionSnapshot>,
    pub notice_rx: &'a Receiver<String>,
}

/// Main terminal event loop: handles input, UI drawing and the channels
/// feeding the presentation. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    inputs: &Inputs<'_>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Latest snapshot wins.
        while let Ok(snapshot) = inputs.snapshot_rx.try_recv() {
            inputs.mpris.set_position(snapshot.position);
            app.pull(snapshot);
        }

        while let Ok(notice) = inputs.notice_rx.try_recv() {
            app.set_notice(notice, Instant::now());
        }

        let now = Instant::now();
        app.expire_notice(now);
        let view = inputs.notification.current();
        terminal.draw(|f| ui::draw(f, app, &view, &settings.ui, &settings.controls, now))?;

        while let Ok(cmd) = inputs.control_rx.try_recv() {
            debug!(?cmd, "control command");
            let cmds = app.control(cmd);
            dispatch(inputs.session, app, cmds);
        }
        if app.should_quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                handle_key_event(key, settings, app, inputs, state);
                if app.should_quit {
                    return Ok(());
                }
            }
        }
    }
}

/// Send intents to the session, wait for the control thread to publish
/// their effects, then refresh the presentation from it.
fn dispatch(session: &SessionHandle, app: &mut App, cmds: Vec<SessionCmd>) {
    if cmds.is_empty() {
        return;
    }
    for cmd in cmds {
        if let Err(e) = session.send(cmd) {
            warn!(error = %e, "session is gone; dropping command");
            return;
        }
    }
    app.pull(session.settle(SETTLE_TIMEOUT));
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    inputs: &Inputs<'_>,
    state: &mut EventLoopState,
) {
    let scrub_ms = settings.controls.scrub_seconds.saturating_mul(1000).min(i64::MAX as u64) as i64;

    let cmds = match key.code {
        KeyCode::Char('g') => {
            if state.pending_gg {
                app.select_first();
            }
            state.pending_gg = !state.pending_gg;
            return;
        }
        KeyCode::Char('q') => {
            app.should_quit = true;
            Vec::new()
        }
        KeyCode::Char('G') => {
            app.select_last();
            Vec::new()
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            Vec::new()
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            Vec::new()
        }
        KeyCode::Enter => app.activate_selected(),
        KeyCode::Char('p') | KeyCode::Char(' ') => app.play_pause(),
        KeyCode::Char('l') | KeyCode::Char('n') => app.next(),
        KeyCode::Char('h') | KeyCode::Char('b') => app.previous(),
        KeyCode::Char('L') => app.seek_by(scrub_ms),
        KeyCode::Char('H') => app.seek_by(-scrub_ms),
        KeyCode::Char('s') => app.toggle_shuffle(&mut rand::thread_rng()),
        KeyCode::Char('K') => {
            app.toggle_metadata_window();
            Vec::new()
        }
        KeyCode::Char(c @ '1'..='3') => {
            let button = c as usize - '1' as usize;
            match inputs.notification.dispatch(button) {
                Some(cmd) => app.control(cmd),
                None => Vec::new(),
            }
        }
        KeyCode::Char('o') => {
            let cmd = inputs.notification.open();
            app.control(cmd)
        }
        _ => Vec::new(),
    };

    // `g` pending should clear on any other key.
    state.pending_gg = false;
    dispatch(inputs.session, app, cmds);
}
