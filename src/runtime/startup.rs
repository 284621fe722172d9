use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::app::App;
use crate::config;
use crate::library::{ensure_readable, scan};
use crate::session::SessionCmd;

/// Build the presentation model for `dir` and the commands that prime the
/// session with it.
///
/// The scan only runs once the folder is readable; otherwise the catalog
/// stays empty and the reason is shown once as a notice.
pub fn prepare(
    dir: &Path,
    open: Option<&Path>,
    settings: &config::Settings,
) -> (App, Vec<SessionCmd>) {
    let tracks = match ensure_readable(dir) {
        Ok(()) => scan(dir, &settings.library),
        Err(e) => {
            error!(dir = %dir.display(), error = %e, "music folder not accessible");
            let mut app = App::new(Vec::new());
            configure(&mut app, dir, settings);
            app.set_notice(e.to_string(), Instant::now());
            let cmds = vec![app.sync_playlist()];
            return (app, cmds);
        }
    };

    info!(dir = %dir.display(), count = tracks.len(), "library loaded");
    let mut app = App::new(tracks);
    configure(&mut app, dir, settings);

    let mut cmds = Vec::new();
    if settings.playback.shuffle {
        cmds.push(app.set_shuffle(true, &mut rand::thread_rng()));
    } else {
        cmds.push(app.sync_playlist());
    }

    if let Some(path) = open {
        if app.has_tracks() {
            cmds.extend(app.open_request(path));
        } else {
            warn!(path = %path.display(), "cannot open file: library is empty");
        }
    }

    (app, cmds)
}

fn configure(app: &mut App, dir: &Path, settings: &config::Settings) {
    app.set_current_dir(dir.display().to_string());
    app.set_notice_ttl(Duration::from_secs(settings.ui.notice_seconds));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::write_silent_wav;

    #[test]
    fn missing_folder_leaves_catalog_empty_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let (app, cmds) = prepare(&missing, None, &config::Settings::default());

        assert!(!app.has_tracks());
        assert!(app.notice(Instant::now()).unwrap().contains("does not exist"));
        assert!(matches!(cmds.as_slice(), [SessionCmd::SetPlaylist(t)] if t.is_empty()));
    }

    #[test]
    fn readable_folder_primes_the_session_playlist() {
        let dir = tempfile::tempdir().unwrap();
        write_silent_wav(&dir.path().join("b.wav"), 100);
        write_silent_wav(&dir.path().join("a.wav"), 100);

        let (app, cmds) = prepare(dir.path(), None, &config::Settings::default());

        assert_eq!(app.tracks.len(), 2);
        match cmds.as_slice() {
            [SessionCmd::SetPlaylist(t)] => {
                assert_eq!(t.len(), 2);
                assert_eq!(t[0].title, "a.wav");
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn open_request_plays_the_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        write_silent_wav(&dir.path().join("a.wav"), 100);
        write_silent_wav(&dir.path().join("b.wav"), 100);

        let requested = dir.path().join("b.wav");
        let (_app, cmds) = prepare(dir.path(), Some(&requested), &config::Settings::default());

        assert!(matches!(cmds.as_slice(), [SessionCmd::SetPlaylist(_), SessionCmd::PlayAt(1)]));
    }

    #[test]
    fn shuffle_default_reorders_without_starting() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.wav", "b.wav", "c.wav"] {
            write_silent_wav(&dir.path().join(name), 100);
        }
        let mut settings = config::Settings::default();
        settings.playback.shuffle = true;

        let (app, cmds) = prepare(dir.path(), None, &settings);

        assert!(app.shuffle);
        match cmds.as_slice() {
            [SessionCmd::SetPlaylist(t)] => assert_eq!(t.len(), 3),
            other => panic!("unexpected commands: {other:?}"),
        }
    }
}
