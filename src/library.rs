//! Track catalog: directory scanning, metadata inspection and list labels.
//!
//! The catalog is produced once per scan and handed read-only to the
//! playback session, which keeps its own copy.

mod access;
mod display;
mod model;
mod scan;

pub use access::{LibraryError, ensure_readable};
pub use display::display_from_fields;
pub use model::Track;
pub use scan::scan;
