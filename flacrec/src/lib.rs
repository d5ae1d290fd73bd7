//! # flacrec
//!
//! Records a streaming player's audio output one track at a time.
//!
//! **Purpose:** Poll the player's status API, cut the line-level capture at
//! every track change, and convert each capture into a tagged FLAC file with
//! embedded cover art.
//!
//! **Architecture:** An async polling loop ([`monitor`]) drives a single
//! capture process ([`recording`]) and hands finished captures through a
//! blocking [`queue`] to conversion worker threads ([`conversion`]).

pub mod app;
pub mod config;
pub mod conversion;
pub mod error;
pub mod monitor;
pub mod player;
pub mod queue;
pub mod recording;

pub use app::Recorder;
pub use error::{Error, Result};
