//! Playback monitor: track-change detection and the polling loop

pub mod runner;
pub mod state;

pub use runner::{MonitorSettings, PlaybackMonitor};
pub use state::{MonitorState, Observation, DEFAULT_HEARTBEAT_TICKS};
