//! Track-change detection
//!
//! Pure state machine over successive [`TrackSnapshot`]s. It performs no I/O;
//! [`PlaybackMonitor`](super::PlaybackMonitor) acts on the returned
//! [`Observation`].
//!
//! A snapshot without an extractable track id never counts as a change: the
//! previous id is kept. A player that keeps reporting malformed URLs can
//! therefore hide a real track change until a well-formed URL shows up.

use crate::player::TrackSnapshot;

/// Default number of unchanged polls between "still playing" notices
pub const DEFAULT_HEARTBEAT_TICKS: u32 = 120;

/// What a single poll means for the recording
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// No track id seen yet; nothing to compare against
    AwaitingIdentity,

    /// First identified track; becomes the reference, no change event
    Initialized,

    /// Same track as before (or no id this poll)
    Unchanged {
        /// Heartbeat threshold reached on this poll
        heartbeat: bool,
    },

    /// A different track id was extracted
    Changed {
        /// Snapshot of the track that just ended
        finished: TrackSnapshot,
    },
}

/// Rolling identity of the track being recorded
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Snapshot taken when the current track was first seen; always has a track id
    previous: Option<TrackSnapshot>,
    heartbeat_count: u32,
    heartbeat_ticks: u32,
}

impl MonitorState {
    pub fn new(heartbeat_ticks: u32) -> Self {
        Self {
            previous: None,
            heartbeat_count: 0,
            heartbeat_ticks: heartbeat_ticks.max(1),
        }
    }

    /// Snapshot of the track currently being recorded
    pub fn previous_snapshot(&self) -> Option<&TrackSnapshot> {
        self.previous.as_ref()
    }

    pub fn previous_track_id(&self) -> Option<&str> {
        self.previous
            .as_ref()
            .and_then(|snapshot| snapshot.track_id.as_deref())
    }

    pub fn is_initialized(&self) -> bool {
        self.previous.is_some()
    }

    /// Feed one poll result and update the rolling identity
    pub fn observe(&mut self, snapshot: &TrackSnapshot) -> Observation {
        let Some(current_id) = snapshot.track_id.as_deref() else {
            // Unidentifiable poll: keep the previous id
            return if self.previous.is_some() {
                self.unchanged()
            } else {
                Observation::AwaitingIdentity
            };
        };

        let Some(previous) = self.previous.as_ref() else {
            self.previous = Some(snapshot.clone());
            self.heartbeat_count = 0;
            return Observation::Initialized;
        };

        if previous.track_id.as_deref() == Some(current_id) {
            return self.unchanged();
        }

        let finished = std::mem::replace(&mut self.previous, Some(snapshot.clone()));
        self.heartbeat_count = 0;

        match finished {
            Some(finished) => Observation::Changed { finished },
            None => Observation::Initialized,
        }
    }

    fn unchanged(&mut self) -> Observation {
        self.heartbeat_count += 1;
        let heartbeat = self.heartbeat_count >= self.heartbeat_ticks;
        if heartbeat {
            self.heartbeat_count = 0;
        }
        Observation::Unchanged { heartbeat }
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_TICKS)
    }
}
