use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::ControlCmd;
use crate::cli::Args;
use crate::config;
use crate::engine::RodioEngine;
use crate::notification::NotificationCenter;
use crate::session::{PositionTicker, SessionCmd, SessionHandle, SessionObserver, SessionSnapshot};

mod event_loop;
mod settings;
mod startup;

pub use settings::load_settings;

pub fn run(args: Args, settings: config::Settings) -> Result<(), Box<dyn std::error::Error>> {
    let dir = args.dir.unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    info!(dir = %dir.display(), "starting");

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);
    let notification = NotificationCenter::new();

    let (notice_tx, notice_rx) = mpsc::channel::<String>();
    let observers: Vec<Box<dyn SessionObserver + Send>> =
        vec![Box::new(mpris.clone()), Box::new(notification.clone())];
    let session = SessionHandle::spawn(
        RodioEngine::open_default,
        observers,
        &settings.session,
        notice_tx,
    );

    let (mut app, startup_cmds) = startup::prepare(&dir, args.open.as_deref(), &settings);
    for cmd in startup_cmds {
        send(&session, cmd);
    }

    let (snapshot_tx, snapshot_rx) = mpsc::channel::<SessionSnapshot>();
    let mut ticker = PositionTicker::spawn(
        Duration::from_millis(settings.ui.position_poll_ms),
        session.snapshot_handle(),
        snapshot_tx,
    );

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let inputs = event_loop::Inputs {
        session: &session,
        notification: &notification,
        mpris: &mpris,
        control_rx: &control_rx,
        snapshot_rx: &snapshot_rx,
        notice_rx: &notice_rx,
    };
    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &inputs, &mut state);

    // The presentation surface goes away first so nothing reads a stopped session.
    ticker.cancel();
    session.stop();
    info!(notification_renders = notification.renders(), "stopped");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn send(session: &SessionHandle, cmd: SessionCmd) {
    if let Err(e) = session.send(cmd) {
        warn!(error = %e, "session is gone; dropping command");
    }
}
