use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::sink::create_sink_at;
use super::types::{EngineError, PlaybackEngine};

struct Loaded {
    sink: Sink,
    path: PathBuf,
    duration: Duration,
    clock: SinkClock,
    started: bool,
}

/// Maps the sink's clock to a position in the file.
///
/// A rebuilt sink plays a `skip_duration` source and counts from zero, so
/// its clock is shifted by the skip. `SkipDuration` hands seeks to the
/// decoder unchanged, so direct seeks always take the absolute target and
/// the sink reports absolute positions again afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SinkClock {
    offset: Duration,
}

impl SinkClock {
    fn rebuilt_at(start: Duration) -> Self {
        Self { offset: start }
    }

    /// Target for `Sink::try_seek`; the shift is gone once that succeeds.
    fn direct_seek(&self, target: Duration) -> (Duration, SinkClock) {
        (target, SinkClock::default())
    }

    fn position(&self, sink_pos: Duration) -> Duration {
        self.offset + sink_pos
    }
}

/// `PlaybackEngine` backed by the default rodio output device.
///
/// The output stream is bound to the thread that opened it, so the engine
/// must be created on the session's control thread.
pub struct RodioEngine {
    stream: OutputStream,
    loaded: Option<Loaded>,
}

impl RodioEngine {
    pub fn open_default() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped, which corrupts the TUI.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            loaded: None,
        })
    }
}

fn probe_duration(path: &Path) -> Duration {
    match lofty::read_from_path(path) {
        Ok(tagged) => tagged.properties().duration(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not probe duration");
            Duration::ZERO
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, source: &Path) -> Result<(), EngineError> {
        self.release();

        let (sink, total) = create_sink_at(&self.stream, source, Duration::ZERO)?;
        let duration = total.unwrap_or_else(|| probe_duration(source));
        debug!(path = %source.display(), ?duration, "loaded source");

        self.loaded = Some(Loaded {
            sink,
            path: source.to_path_buf(),
            duration,
            clock: SinkClock::default(),
            started: false,
        });
        Ok(())
    }

    fn start(&mut self) {
        if let Some(l) = self.loaded.as_mut() {
            l.sink.play();
            l.started = true;
        }
    }

    fn pause(&mut self) {
        if let Some(l) = self.loaded.as_ref() {
            l.sink.pause();
        }
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        let Some(l) = self.loaded.as_mut() else {
            return Err(EngineError::NotLoaded);
        };

        let target = if l.duration.is_zero() {
            position
        } else {
            position.min(l.duration)
        };

        let (sink_target, clock) = l.clock.direct_seek(target);
        if l.sink.try_seek(sink_target).is_ok() {
            l.clock = clock;
            return Ok(());
        }

        // Decoder cannot seek: rebuild the sink and skip into the file.
        debug!(?target, "rebuilding sink to seek");
        let was_paused = l.sink.is_paused();
        l.sink.stop();
        let (sink, _) = create_sink_at(&self.stream, &l.path, target)?;
        if !was_paused {
            sink.play();
        }
        l.sink = sink;
        l.clock = SinkClock::rebuilt_at(target);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|l| l.clock.position(l.sink.get_pos()))
            .unwrap_or(Duration::ZERO)
    }

    fn duration(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|l| l.duration)
            .unwrap_or(Duration::ZERO)
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn is_playing(&self) -> bool {
        self.loaded
            .as_ref()
            .map(|l| l.started && !l.sink.is_paused() && !l.sink.empty())
            .unwrap_or(false)
    }

    fn is_finished(&self) -> bool {
        self.loaded
            .as_ref()
            .map(|l| l.started && l.sink.empty())
            .unwrap_or(false)
    }

    fn release(&mut self) {
        if let Some(l) = self.loaded.take() {
            l.sink.stop();
            debug!(path = %l.path.display(), "released source");
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::write_silent_wav;

    #[test]
    fn probe_duration_reads_container_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_silent_wav(&path, 1500);

        let d = probe_duration(&path);
        assert!((1490..=1510).contains(&d.as_millis()), "got {d:?}");
    }

    #[test]
    fn probe_duration_of_garbage_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ogg");
        std::fs::write(&path, b"not audio").unwrap();

        assert_eq!(probe_duration(&path), Duration::ZERO);
    }

    #[test]
    fn direct_seek_after_rebuild_uses_absolute_target() {
        let clock = SinkClock::rebuilt_at(Duration::from_secs(30));
        assert_eq!(clock.position(Duration::from_secs(5)), Duration::from_secs(35));

        let (sink_target, clock) = clock.direct_seek(Duration::from_secs(40));
        assert_eq!(sink_target, Duration::from_secs(40));
        // The sink clock restarts at the seek target.
        assert_eq!(clock.position(sink_target), Duration::from_secs(40));

        let (back, clock) = clock.direct_seek(Duration::from_secs(10));
        assert_eq!(back, Duration::from_secs(10));
        assert_eq!(clock.position(back), Duration::from_secs(10));
    }

    #[test]
    fn missing_source_is_reported_by_path() {
        let err = EngineError::NotFound(PathBuf::from("/music/gone.mp3"));
        assert_eq!(err.to_string(), "source file /music/gone.mp3 does not exist");
    }
}
