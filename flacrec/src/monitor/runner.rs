//! Polling loop
//!
//! [`PlaybackMonitor`] polls the player at a fixed cadence, feeds each
//! snapshot through [`MonitorState`] and, on a track change, runs the
//! hand-over sequence:
//!
//! 1. Pause the player
//! 2. Stop the capture, queuing it under the finished track's metadata
//! 3. Wait for the capture device to settle
//! 4. Start the next capture
//! 5. Resume the player
//!
//! Player and controller failures are logged and the sequence continues;
//! transport desync is corrected by the next change.

use super::state::{MonitorState, Observation};
use crate::error::Result;
use crate::player::{PlayerClient, TrackSnapshot};
use crate::recording::{RecordingController, StopOutcome};
use chrono::Utc;
use flacrec_common::config::MonitorConfig;
use flacrec_common::events::{EventBus, RecorderEvent};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub heartbeat_ticks: u32,
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            heartbeat_ticks: config.heartbeat_ticks,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

/// Drives the recording controller from player status polls
pub struct PlaybackMonitor {
    player: PlayerClient,
    controller: RecordingController,
    state: MonitorState,
    events: EventBus,
    settings: MonitorSettings,
    /// Consecutive failed polls, used to avoid logging every one
    failed_polls: u32,
}

impl PlaybackMonitor {
    pub fn new(
        player: PlayerClient,
        controller: RecordingController,
        events: EventBus,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            player,
            controller,
            state: MonitorState::new(settings.heartbeat_ticks),
            events,
            settings,
            failed_polls: 0,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn controller(&self) -> &RecordingController {
        &self.controller
    }

    /// Start the first capture and resume playback
    ///
    /// A capture that cannot be started is fatal here; later failures are not.
    pub async fn begin(&mut self) -> Result<()> {
        self.controller.start()?;
        if let Err(e) = self.player.play().await {
            warn!("Could not resume playback: {}", e);
        }
        Ok(())
    }

    /// Perform one poll
    ///
    /// Returns `None` when the player could not be polled.
    pub async fn tick(&mut self) -> Option<Observation> {
        let snapshot = match self.player.current().await {
            Ok(snapshot) => {
                if self.failed_polls > 0 {
                    info!("Player reachable again after {} failed polls", self.failed_polls);
                    self.failed_polls = 0;
                }
                snapshot.unwrap_or_default()
            }
            Err(e) => {
                if self.failed_polls == 0 {
                    warn!("Player poll failed: {}", e);
                } else {
                    debug!("Player poll failed: {}", e);
                }
                self.failed_polls += 1;
                return None;
            }
        };

        let observation = self.state.observe(&snapshot);

        match &observation {
            Observation::AwaitingIdentity => {
                debug!("Waiting for a track id from the player");
            }
            Observation::Initialized => {
                info!("Now playing: {}", snapshot.label());
                self.emit_track_started(&snapshot);
            }
            Observation::Unchanged { heartbeat: true } => self.heartbeat(),
            Observation::Unchanged { heartbeat: false } => {}
            Observation::Changed { finished } => {
                self.change_track(finished, &snapshot).await;
            }
        }

        Some(observation)
    }

    /// Poll until `shutdown` resolves
    ///
    /// A tick in progress always completes, so a hand-over is never cut in half.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            url = %self.player.base_url(),
            interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Playback monitor started"
        );

        loop {
            self.tick().await;

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, playback monitor stopping");
                    break;
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    /// Stop the active capture on shutdown
    ///
    /// The capture is queued under the last known track; with no known track
    /// it is abandoned.
    pub fn finish(&mut self) {
        if !self.controller.is_recording() {
            return;
        }

        match self.state.previous_snapshot().cloned() {
            Some(snapshot) => match self.controller.stop(&snapshot) {
                Ok(outcome) => log_stop_outcome(&snapshot, &outcome),
                Err(e) => error!("Final stop of {} failed: {}", snapshot.label(), e),
            },
            None => {
                if let Err(e) = self.controller.abandon() {
                    error!("Could not abandon recording: {}", e);
                }
            }
        }
    }

    async fn change_track(&mut self, finished: &TrackSnapshot, current: &TrackSnapshot) {
        info!("Track changed: {} -> {}", finished.label(), current.label());

        if let Err(e) = self.player.pause().await {
            warn!("Could not pause playback: {}", e);
        }

        if self.controller.is_recording() {
            match self.controller.stop(finished) {
                Ok(outcome) => log_stop_outcome(finished, &outcome),
                Err(e) => error!("Stopping recording of {} failed: {}", finished.label(), e),
            }
        } else {
            warn!("No active recording for {}", finished.label());
        }

        tokio::time::sleep(self.settings.settle_delay).await;

        if let Err(e) = self.controller.start() {
            error!("Could not start recording {}: {}", current.label(), e);
        }

        if let Err(e) = self.player.play().await {
            warn!("Could not resume playback: {}", e);
        }

        self.emit_track_started(current);
    }

    fn heartbeat(&mut self) {
        let Some(track_id) = self.state.previous_track_id().map(str::to_string) else {
            return;
        };

        let alive = self.controller.is_capture_alive();
        info!(track_id = %track_id, capture_alive = alive, "Still recording");
        if self.controller.is_recording() && !alive {
            warn!("Capture process has exited; this track will be incomplete");
        }

        self.events.emit_lossy(RecorderEvent::Heartbeat {
            track_id,
            timestamp: Utc::now(),
        });
    }

    fn emit_track_started(&self, snapshot: &TrackSnapshot) {
        self.events.emit_lossy(RecorderEvent::TrackStarted {
            track_id: snapshot.track_id.clone().unwrap_or_default(),
            title: snapshot.title.clone(),
            artists: snapshot.artists.clone(),
            timestamp: Utc::now(),
        });
    }
}

fn log_stop_outcome(snapshot: &TrackSnapshot, outcome: &StopOutcome) {
    match outcome {
        StopOutcome::Queued { destination } => {
            debug!("{} queued for {}", snapshot.label(), destination.display())
        }
        StopOutcome::Discarded { destination } => {
            debug!("{} discarded, {} exists", snapshot.label(), destination.display())
        }
        StopOutcome::NotCaptured => debug!("{} not captured", snapshot.label()),
    }
}
