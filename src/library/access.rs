use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("music folder {0} does not exist")]
    NotFound(PathBuf),
    #[error("permission denied reading {0}")]
    PermissionDenied(PathBuf),
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Gate the catalog scan on read access to `dir`.
///
/// The scan is only run once this succeeds; on failure the catalog stays
/// empty and the caller shows the error once.
pub fn ensure_readable(dir: &Path) -> Result<(), LibraryError> {
    match fs::read_dir(dir) {
        Ok(_) => Ok(()),
        Err(e) => Err(match e.kind() {
            io::ErrorKind::NotFound => LibraryError::NotFound(dir.to_path_buf()),
            io::ErrorKind::PermissionDenied => LibraryError::PermissionDenied(dir.to_path_buf()),
            _ => LibraryError::Unreadable {
                path: dir.to_path_buf(),
                source: e,
            },
        }),
    }
}
