//! Player status polling and transport control

pub mod client;
pub mod snapshot;

pub use client::{ControlError, PlayerClient, PollError};
pub use snapshot::{extract_track_id, sanitize_file_name, TrackSnapshot};
