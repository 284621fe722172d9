use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use super::controller::SnapshotHandle;
use super::types::SessionSnapshot;

/// Periodic, cancellable task that pushes the session's latest snapshot to
/// a presentation surface.
///
/// Staleness of what the surface shows is bounded by `interval`. The task
/// stops when cancelled, when dropped, or when the receiving side is gone.
pub struct PositionTicker {
    cancel: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl PositionTicker {
    pub fn spawn(interval: Duration, source: SnapshotHandle, tx: Sender<SessionSnapshot>) -> Self {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let join = thread::spawn(move || {
            loop {
                match cancel_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // Cancelled explicitly or the ticker was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let snapshot = match source.lock() {
                    Ok(s) => s.clone(),
                    Err(_) => break,
                };
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
            debug!("position ticker stopped");
        });

        Self {
            cancel: Some(cancel_tx),
            join: Some(join),
        }
    }

    /// Stop ticking and wait for the task to exit.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }
}

impl Drop for PositionTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
