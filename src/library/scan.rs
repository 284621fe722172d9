use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

pub(super) const UNKNOWN_ARTIST: &str = "Unknown";

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

struct Inspected {
    title: String,
    artist: String,
    duration: Duration,
}

/// Read title/artist/duration from the file's tags and stream properties.
///
/// Absent fields fall back to the file name, `"Unknown"` and zero.
fn inspect(path: &Path) -> Result<Inspected, lofty::error::LoftyError> {
    let tagged = lofty::read_from_path(path)?;

    let mut title = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = UNKNOWN_ARTIST.to_string();
    let duration = tagged.properties().duration();

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title() {
            let v = v.trim();
            if !v.is_empty() {
                title = v.to_string();
            }
        }
        if let Some(v) = tag.artist() {
            let v = v.trim();
            if !v.is_empty() {
                artist = v.to_string();
            }
        }
    }

    Ok(Inspected {
        title,
        artist,
        duration,
    })
}

/// Scan `dir` for audio files and build the catalog.
///
/// Files whose metadata cannot be read are logged and skipped; they never
/// abort the scan. Tracks are ordered by their list label and numbered from 1.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let entries = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file()
            || !(settings.include_hidden || !is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let meta = match inspect(path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file with unreadable metadata");
                continue;
            }
        };

        let display_text = display_from_fields(
            path,
            &meta.title,
            &meta.artist,
            &settings.display_fields,
            &settings.display_separator,
        );
        debug!(path = %path.display(), display = %display_text, "catalogued track");

        tracks.push(Track {
            id: 0,
            title: meta.title,
            artist: meta.artist,
            duration: meta.duration,
            path: path.to_path_buf(),
            display: display_text,
        });
    }

    tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    for (i, t) in tracks.iter_mut().enumerate() {
        t.id = i as u64 + 1;
    }

    info!(dir = %dir.display(), count = tracks.len(), "library scan finished");
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackDisplayField;
    use crate::library::tests::write_silent_wav;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.m4a"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.aac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.ogg"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn scan_filters_non_audio_and_numbers_by_display_order() {
        let dir = tempdir().unwrap();

        write_silent_wav(&dir.path().join("b.wav"), 1000);
        write_silent_wav(&dir.path().join("A.wav"), 500);
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

        let settings = LibrarySettings {
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].display, "A");
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[1].display, "b");
        assert_eq!(tracks[1].id, 2);
    }

    #[test]
    fn untagged_files_fall_back_to_file_name_and_unknown_artist() {
        let dir = tempdir().unwrap();
        write_silent_wav(&dir.path().join("take one.wav"), 1500);

        let tracks = scan(dir.path(), &LibrarySettings::default());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "take one.wav");
        assert_eq!(tracks[0].artist, UNKNOWN_ARTIST);
        let ms = tracks[0].duration.as_millis();
        assert!((1490..=1510).contains(&ms), "duration was {ms}ms");
    }

    #[test]
    fn unreadable_files_are_skipped_without_aborting_the_scan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.ogg"), b"not a real ogg").unwrap();
        write_silent_wav(&dir.path().join("fine.wav"), 200);

        let settings = LibrarySettings {
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].display, "fine");
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        write_silent_wav(&dir.path().join(".hidden.wav"), 100);
        write_silent_wav(&dir.path().join("visible.wav"), 100);

        let settings = LibrarySettings {
            include_hidden: false,
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].display, "visible");
    }

    #[test]
    fn scan_respects_recursive_false() {
        let dir = tempdir().unwrap();
        write_silent_wav(&dir.path().join("root.wav"), 100);
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        write_silent_wav(&sub.join("child.wav"), 100);

        let settings = LibrarySettings {
            recursive: false,
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].display, "root");
    }

    #[test]
    fn scan_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        write_silent_wav(&dir.path().join("root.wav"), 100);
        write_silent_wav(&d1.join("one.wav"), 100);
        write_silent_wav(&d2.join("two.wav"), 100);

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
        let settings = LibrarySettings {
            max_depth: Some(2),
            display_fields: vec![TrackDisplayField::Filename],
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);

        let names: Vec<String> = tracks.iter().map(|t| t.display.clone()).collect();
        assert!(names.contains(&"root".to_string()));
        assert!(names.contains(&"one".to_string()));
        assert!(!names.contains(&"two".to_string()));
    }
}
