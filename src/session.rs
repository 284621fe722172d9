//! Playback session: the single owner of the playlist, the cursor and the
//! play/pause intent.
//!
//! [`PlaybackSession`] is the synchronous state machine. [`SessionHandle`]
//! runs it on a dedicated control thread and serializes user commands with
//! end-of-track transitions. [`PositionTicker`] feeds presentation surfaces
//! with periodic snapshots.

mod controller;
mod machine;
mod projection;
mod ticker;
mod types;

pub use controller::{SessionHandle, SnapshotHandle};
pub use machine::PlaybackSession;
pub use projection::{MediaMetadata, PlaybackStatus, SessionObserver};
pub use ticker::PositionTicker;
pub use types::{PlaybackIntent, SessionCmd, SessionSnapshot};

#[cfg(test)]
pub(crate) mod fake;
