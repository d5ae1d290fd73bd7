//! # flacrec Common Library
//!
//! Shared code for the flacrec workspace including:
//! - Error types
//! - TOML configuration file model and discovery
//! - Event types (RecorderEvent enum) and the broadcast event bus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, RecorderEvent};
