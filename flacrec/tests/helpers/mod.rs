//! Test helper modules for flacrec integration tests
//!
//! Provides reusable test infrastructure components:
//! - FakePlayer: in-process player HTTP API with scripted `/current` responses
//! - FakeLauncher: capture launcher that writes placeholder temp files
//! - Fixtures: minimal FLAC files, PNG bytes, a scripted transcoder

#![allow(dead_code)]

pub mod fake_capture;
pub mod fake_player;
pub mod fixtures;

pub use fake_capture::FakeLauncher;
pub use fake_player::{status, FakePlayer};
pub use fixtures::{minimal_flac, test_config, FakeTranscoder, PNG_BYTES};

use flacrec_common::events::RecorderEvent;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Ordered record of side effects shared between fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Collect every event currently buffered in `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<RecorderEvent>) -> Vec<RecorderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait for the first event matching `predicate`
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<RecorderEvent>,
    timeout: Duration,
    predicate: F,
) -> Option<RecorderEvent>
where
    F: Fn(&RecorderEvent) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
