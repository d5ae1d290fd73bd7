//! Error types for flacrec
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the flacrec crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from the common crate
    #[error(transparent)]
    Common(#[from] flacrec_common::Error),

    /// `start` called while a capture is running
    #[error("Already recording to {0}")]
    AlreadyRecording(PathBuf),

    /// `stop` called with no capture running
    #[error("Not recording")]
    NotRecording,

    /// Capture process could not be started
    #[error("Capture error: {0}")]
    Capture(String),

    /// Conversion queue rejected the job
    #[error("Queue error: {0}")]
    Queue(String),

    /// Transcoding the temp capture failed
    #[error("Conversion failed for {path}: {reason}")]
    Conversion { path: PathBuf, reason: String },

    /// Writing tags or pictures failed
    #[error("Tagging failed for {path}: {reason}")]
    Tagging { path: PathBuf, reason: String },

    /// Cover art download or embedding failed
    #[error("Artwork error: {0}")]
    Artwork(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using flacrec Error
pub type Result<T> = std::result::Result<T, Error>;
