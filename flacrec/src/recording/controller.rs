//! Recording Controller
//!
//! Owns the single recording session and mediates between the playback
//! monitor, the capture process and the conversion queue.
//!
//! State machine:
//!
//! ```text
//! Idle --start--> Recording --stop(destination exists)--> Idle   (capture discarded)
//!                 Recording --stop(new track)----------> Idle   (job queued)
//! ```
//!
//! `abandon` stops and deletes a capture that has no track metadata.
//! `start` while recording and `stop` while idle are errors. The controller
//! is driven from the monitor task only, so it takes `&mut self` and needs
//! no locking.

use super::process::{CaptureHandle, CaptureLauncher};
use crate::conversion::job::{destination_for, ConversionJob};
use crate::error::{Error, Result};
use crate::player::TrackSnapshot;
use crate::queue::TaskQueue;
use chrono::{DateTime, Utc};
use flacrec_common::events::{EventBus, RecorderEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Paths and tagging defaults used when building jobs
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Directory for in-progress captures
    pub temp_dir: PathBuf,

    /// Directory holding finished FLAC files
    pub output_dir: PathBuf,

    /// Album tag applied to every job
    pub default_album: String,

    /// Delete downloaded cover art after embedding
    pub clean_art_file: bool,
}

/// Active capture
struct ActiveCapture {
    temp_file: PathBuf,
    started_at: DateTime<Utc>,
    handle: Box<dyn CaptureHandle>,
}

/// Recording session state
///
/// The temp file exists exactly when a capture is active.
enum RecordingSession {
    Idle,
    Recording(ActiveCapture),
}

/// Result of a successful `stop`
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// Job handed to the conversion queue
    Queued { destination: PathBuf },

    /// Destination already existed; temp capture deleted
    Discarded { destination: PathBuf },

    /// Interface-check mode; nothing was captured, nothing queued
    NotCaptured,
}

/// Owner of the capture process lifecycle
pub struct RecordingController {
    launcher: Box<dyn CaptureLauncher>,
    queue: Arc<TaskQueue<ConversionJob>>,
    events: EventBus,
    settings: ControllerSettings,
    session: RecordingSession,
}

impl RecordingController {
    pub fn new(
        launcher: Box<dyn CaptureLauncher>,
        queue: Arc<TaskQueue<ConversionJob>>,
        events: EventBus,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            launcher,
            queue,
            events,
            settings,
            session: RecordingSession::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.session, RecordingSession::Recording(_))
    }

    /// Temp file of the active capture
    pub fn temp_file(&self) -> Option<&Path> {
        match &self.session {
            RecordingSession::Recording(active) => Some(&active.temp_file),
            RecordingSession::Idle => None,
        }
    }

    /// Whether the capture process is still running
    pub fn is_capture_alive(&mut self) -> bool {
        match &mut self.session {
            RecordingSession::Recording(active) => active.handle.is_alive(),
            RecordingSession::Idle => false,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Start capturing into a fresh temp file
    ///
    /// Returns the temp file path.
    pub fn start(&mut self) -> Result<PathBuf> {
        if let RecordingSession::Recording(active) = &self.session {
            return Err(Error::AlreadyRecording(active.temp_file.clone()));
        }

        let temp_file = self
            .settings
            .temp_dir
            .join(format!("tmp-rec-{}.wav", Uuid::new_v4()));

        let handle = self.launcher.launch(&temp_file)?;

        info!("Recording {} started", temp_file.display());
        self.events.emit_lossy(RecorderEvent::RecordingStarted {
            temp_file: temp_file.to_string_lossy().to_string(),
            timestamp: Utc::now(),
        });

        self.session = RecordingSession::Recording(ActiveCapture {
            temp_file: temp_file.clone(),
            started_at: Utc::now(),
            handle,
        });

        Ok(temp_file)
    }

    /// Stop the active capture and hand it off for conversion
    ///
    /// `finished` is the snapshot of the track that was being recorded. If
    /// its FLAC already exists the capture is discarded instead.
    pub fn stop(&mut self, finished: &TrackSnapshot) -> Result<StopOutcome> {
        let mut active = match std::mem::replace(&mut self.session, RecordingSession::Idle) {
            RecordingSession::Recording(active) => active,
            RecordingSession::Idle => return Err(Error::NotRecording),
        };

        active.handle.signal_stop();

        let elapsed = Utc::now() - active.started_at;
        info!(
            seconds = elapsed.num_seconds(),
            "Recording {} stopped",
            active.temp_file.display()
        );

        let base_name = finished.base_name();
        let destination = destination_for(&self.settings.output_dir, &base_name);

        if destination.exists() {
            info!(
                "File {} already exists, skipping processing",
                destination.display()
            );
            remove_temp_file(&active.temp_file);
            self.events.emit_lossy(RecorderEvent::RecordingDiscarded {
                base_name,
                timestamp: Utc::now(),
            });
            return Ok(StopOutcome::Discarded { destination });
        }

        if !self.launcher.captures_audio() {
            info!(
                "Interface check: would convert {} to {}",
                active.temp_file.display(),
                destination.display()
            );
            remove_temp_file(&active.temp_file);
            return Ok(StopOutcome::NotCaptured);
        }

        let job = ConversionJob::from_snapshot(
            active.temp_file.clone(),
            finished,
            &self.settings.default_album,
            self.settings.clean_art_file,
        );

        if let Err(e) = self.queue.push(job) {
            error!(
                "Could not queue {} for conversion, temp file kept: {}",
                active.temp_file.display(),
                e
            );
            return Err(e);
        }

        debug!(queued = self.queue.len(), "Conversion job queued for {}", base_name);
        self.events.emit_lossy(RecorderEvent::JobQueued {
            base_name,
            temp_file: active.temp_file.to_string_lossy().to_string(),
            timestamp: Utc::now(),
        });

        Ok(StopOutcome::Queued { destination })
    }

    /// Stop the active capture and delete it without queuing anything
    ///
    /// Used when no track metadata is known for the capture.
    pub fn abandon(&mut self) -> Result<()> {
        let mut active = match std::mem::replace(&mut self.session, RecordingSession::Idle) {
            RecordingSession::Recording(active) => active,
            RecordingSession::Idle => return Err(Error::NotRecording),
        };

        active.handle.signal_stop();
        warn!(
            "Recording {} abandoned, no track metadata",
            active.temp_file.display()
        );
        remove_temp_file(&active.temp_file);
        Ok(())
    }
}

fn remove_temp_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed temp capture {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp capture {}: {}", path.display(), e),
    }
}
