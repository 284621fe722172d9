use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::SessionSettings;
use crate::engine::{EngineError, PlaybackEngine};

use super::machine::PlaybackSession;
use super::projection::SessionObserver;
use super::types::{SessionCmd, SessionSnapshot};

pub type SnapshotHandle = Arc<Mutex<SessionSnapshot>>;

/// Sequence number of the last command whose effects have been published.
#[derive(Default)]
struct Progress {
    applied: Mutex<u64>,
    changed: Condvar,
}

impl Progress {
    fn mark(&self, seq: u64) {
        if let Ok(mut applied) = self.applied.lock() {
            *applied = (*applied).max(seq);
        }
        self.changed.notify_all();
    }

    /// Wait until `seq` is published. Returns false on timeout.
    fn wait_for(&self, seq: u64, timeout: Duration) -> bool {
        let Ok(applied) = self.applied.lock() else {
            return false;
        };
        match self
            .changed
            .wait_timeout_while(applied, timeout, |applied| *applied < seq)
        {
            Ok((_, result)) => !result.timed_out(),
            Err(_) => false,
        }
    }
}

/// Owner-side handle of a session running on its control thread.
///
/// `spawn` starts the thread, `stop` releases the engine and joins it.
/// Commands are applied strictly in send order; end-of-track advances are
/// detected on the same thread after every command and every poll timeout.
pub struct SessionHandle {
    tx: Sender<(u64, SessionCmd)>,
    sent: AtomicU64,
    snapshot: SnapshotHandle,
    progress: Arc<Progress>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl SessionHandle {
    pub fn spawn<E, F>(
        make_engine: F,
        observers: Vec<Box<dyn SessionObserver + Send>>,
        settings: &SessionSettings,
        notices: Sender<String>,
    ) -> Self
    where
        E: PlaybackEngine + 'static,
        F: FnOnce() -> Result<E, EngineError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<(u64, SessionCmd)>();
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(SessionSnapshot::default()));
        let progress = Arc::new(Progress::default());
        let poll = Duration::from_millis(settings.poll_interval_ms.max(1));

        let snapshot_for_thread = snapshot.clone();
        let progress_for_thread = progress.clone();
        let join = thread::spawn(move || {
            let engine = match make_engine() {
                Ok(engine) => engine,
                Err(e) => {
                    error!(error = %e, "playback engine unavailable");
                    let _ = notices.send(format!("Playback unavailable: {e}"));
                    progress_for_thread.mark(u64::MAX);
                    return;
                }
            };

            let mut session = PlaybackSession::new(engine);
            for observer in observers {
                session.add_observer(observer);
            }
            info!(?poll, "session control thread started");
            control_loop(
                &mut session,
                &rx,
                poll,
                &snapshot_for_thread,
                &progress_for_thread,
                &notices,
            );
            // Nothing sent from now on will be applied; release any waiter.
            progress_for_thread.mark(u64::MAX);
            info!("session control thread stopped");
        });

        Self {
            tx,
            sent: AtomicU64::new(0),
            snapshot,
            progress,
            join: Mutex::new(Some(join)),
        }
    }

    pub fn send(&self, cmd: SessionCmd) -> Result<(), SendError<SessionCmd>> {
        let seq = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx
            .send((seq, cmd))
            .map_err(|SendError((_, cmd))| SendError(cmd))
    }

    /// Wait until every command sent so far has been applied and published,
    /// then return the snapshot. Gives up after `timeout` and returns the
    /// latest snapshot as is.
    pub fn settle(&self, timeout: Duration) -> SessionSnapshot {
        let target = self.sent.load(Ordering::SeqCst);
        if !self.progress.wait_for(target, timeout) {
            warn!(?timeout, "session did not catch up; showing last snapshot");
        }
        self.snapshot()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// Shut the session down and wait for the control thread. Idempotent.
    pub fn stop(&self) {
        let _ = self.send(SessionCmd::Shutdown);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn control_loop<E: PlaybackEngine>(
    session: &mut PlaybackSession<E>,
    rx: &Receiver<(u64, SessionCmd)>,
    poll: Duration,
    snapshot: &SnapshotHandle,
    progress: &Progress,
    notices: &Sender<String>,
) {
    publish(session, snapshot, notices);

    loop {
        let applied = match rx.recv_timeout(poll) {
            Ok((seq, SessionCmd::Shutdown)) => {
                session.shutdown();
                publish(session, snapshot, notices);
                progress.mark(seq);
                break;
            }
            Ok((seq, cmd)) => {
                debug!(?cmd, "session command");
                session.apply(cmd);
                Some(seq)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                session.shutdown();
                break;
            }
        };

        // Checked on every iteration so a steady stream of commands cannot
        // hold back the advance.
        if session.engine_finished() {
            session.on_track_finished();
        }
        publish(session, snapshot, notices);
        if let Some(seq) = applied {
            progress.mark(seq);
        }
    }
}

fn publish<E: PlaybackEngine>(
    session: &mut PlaybackSession<E>,
    snapshot: &SnapshotHandle,
    notices: &Sender<String>,
) {
    if let Ok(mut s) = snapshot.lock() {
        *s = session.snapshot();
    }
    while let Some(notice) = session.take_notice() {
        let _ = notices.send(notice);
    }
}
