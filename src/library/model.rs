use std::path::{Path, PathBuf};
use std::time::Duration;

/// One playable audio item with display metadata and a source location.
///
/// `id` is assigned sequentially at scan time and is not stable across
/// rescans. Identity for playback bookkeeping is the source `path`; use
/// [`Track::same_source`] instead of comparing whole records.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    pub path: PathBuf,
    pub display: String,
}

impl Track {
    /// True when both records point at the same source file.
    pub fn same_source(&self, other: &Track) -> bool {
        self.path == other.path
    }

    pub fn is_at(&self, path: &Path) -> bool {
        self.path == path
    }
}
