//! Event types for the flacrec event system
//!
//! Components publish progress on a [`EventBus`]. Nothing in the pipeline
//! depends on a subscriber being present; the bus exists so that status
//! reporting and tests can observe the capture and conversion stages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// flacrec event types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RecorderEvent {
    /// The player moved to a track the monitor has not seen before
    TrackStarted {
        track_id: String,
        title: String,
        artists: String,
        timestamp: DateTime<Utc>,
    },

    /// A capture process was started for a new temp file
    RecordingStarted {
        temp_file: String,
        timestamp: DateTime<Utc>,
    },

    /// A capture was thrown away because the destination already exists
    RecordingDiscarded {
        base_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A finished capture was handed to the conversion queue
    JobQueued {
        base_name: String,
        temp_file: String,
        timestamp: DateTime<Utc>,
    },

    /// A conversion job finished without error
    JobCompleted {
        base_name: String,
        outcome: JobOutcomeKind,
        timestamp: DateTime<Utc>,
    },

    /// A conversion job failed; its temp file was preserved
    JobFailed {
        base_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The same track is still playing
    Heartbeat {
        track_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// How a successful job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcomeKind {
    /// FLAC written and tagged, cover art embedded
    ConvertedWithArt,
    /// FLAC written and tagged, no cover art
    Converted,
    /// Destination already existed, nothing done
    Skipped,
}

/// Broadcast channel for [`RecorderEvent`]s
///
/// Cloning shares the same underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RecorderEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RecorderEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
