use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::app::ControlCmd;
use crate::session::{MediaMetadata, PlaybackIntent, PlaybackStatus, SessionObserver};


const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.rondo";
const NOTIFY_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackIntent,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    position_micros: i64,
}

/// Writer side of the OS media session.
///
/// Registered as a session observer; every metadata or play-state change
/// updates the shared state and wakes the bus thread so it can emit
/// `PropertiesChanged`.
#[derive(Clone)]
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_track_metadata(&self, metadata: Option<&MediaMetadata>) {
        if let Ok(mut s) = self.state.lock() {
            match metadata {
                Some(m) => {
                    s.title = Some(m.title.clone());
                    s.artist = if m.artist.is_empty() {
                        Vec::new()
                    } else {
                        vec![m.artist.clone()]
                    };
                    s.url = Some(format!("file://{}", m.path.display()));
                    s.length_micros = (!m.duration.is_zero()).then(|| micros(m.duration));
                    s.track_id =
                        OwnedObjectPath::try_from(format!("{MPRIS_PATH}/track/{}", m.track_id))
                            .ok();
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    pub fn set_playback(&self, playback: PlaybackIntent, position: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
            s.position_micros = micros(position);
        }
        let _ = self.notify.send(());
    }

    /// Track the live position between transitions. Does not signal: the
    /// Position property is polled by clients.
    pub fn set_position(&self, position: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = micros(position);
        }
    }
}

impl SessionObserver for MprisHandle {
    fn on_metadata(&mut self, metadata: Option<&MediaMetadata>) {
        self.set_track_metadata(metadata);
    }

    fn on_playback_state(&mut self, status: &PlaybackStatus) {
        self.set_playback(status.intent, status.position);
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        let _ = self.tx.send(ControlCmd::Raise);
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "rondo"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    /// There is no stopped-with-track state; stop behaves like pause.
    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    /// Relative seek; `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::SeekBy(offset / 1000));
    }

    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        if position < 0 {
            return;
        }
        let current = self.state.lock().ok().and_then(|s| s.track_id.clone());
        if current.as_ref() != Some(&track_id) {
            debug!(track_id = %track_id.as_str(), "ignoring SetPosition for stale track");
            return;
        }
        let _ = self
            .tx
            .send(ControlCmd::SetPosition(Duration::from_micros(position as u64)));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackIntent::Stopped => "Stopped",
            PlaybackIntent::Playing => "Playing",
            PlaybackIntent::Paused => "Paused",
        }
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let Ok(s) = self.state.lock() else {
            return HashMap::new();
        };
        metadata_map(&s)
    }
}

fn owned<'a>(value: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(value.into()).ok()
}

fn metadata_map(s: &SharedState) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let mut put = |key: &str, value: Option<OwnedValue>| {
        if let Some(v) = value {
            map.insert(key.to_string(), v);
        }
    };

    put(
        "mpris:trackid",
        s.track_id
            .clone()
            .and_then(|id| owned(Value::ObjectPath(id.into_inner()))),
    );
    put("xesam:title", s.title.clone().and_then(|t| owned(t)));
    if !s.artist.is_empty() {
        put("xesam:artist", owned(s.artist.clone()));
    }
    put("xesam:url", s.url.clone().and_then(|u| owned(u)));
    put("mpris:length", s.length_micros.and_then(|l| owned(l)));
    map
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match register(tx, state_for_thread).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "MPRIS unavailable");
                    return;
                }
            };
            info!(name = BUS_NAME, "MPRIS service registered");
            signal_loop(&connection, notify_rx).await;
            debug!("MPRIS service stopped");
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn register(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
) -> zbus::Result<Connection> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(MPRIS_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(MPRIS_PATH, PlayerIface { tx, state })
        .await?;
    Ok(connection)
}

/// Coalesce change notifications and emit `PropertiesChanged` until every
/// handle is gone.
async fn signal_loop(connection: &Connection, notify_rx: Receiver<()>) {
    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut changed = false;
        loop {
            match notify_rx.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if !changed {
            continue;
        }
        if let Err(e) = emit_changes(connection).await {
            warn!(error = %e, "failed to emit MPRIS property changes");
        }
    }
}

async fn emit_changes(connection: &Connection) -> zbus::Result<()> {
    let iface = connection
        .object_server()
        .interface::<_, PlayerIface>(MPRIS_PATH)
        .await?;
    let emitter = iface.signal_emitter();
    let player = iface.get().await;
    player.playback_status_changed(emitter).await?;
    player.metadata_changed(emitter).await?;
    Ok(())
}
