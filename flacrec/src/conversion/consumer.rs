//! Conversion workers
//!
//! Each worker is a dedicated OS thread blocked on [`TaskQueue::pop`], so
//! transcoding, tag writing and art downloads never stall the monitor.
//! Per job:
//!
//! 1. Destination exists → skip (temp capture removed)
//! 2. Transcode temp capture → `<output_dir>/<base_name>.flac`
//! 3. Write artist/title/album tags
//! 4. Download, embed and optionally delete cover art
//! 5. Delete the temp capture
//!
//! A failure in step 2 or 3 keeps the temp capture for manual recovery.
//! Cover art problems only cost the picture. Every job is marked done,
//! whatever happened, so [`TaskQueue::drain`] always returns.

use super::artwork::ArtworkFetcher;
use super::job::ConversionJob;
use super::tagger::{embed_cover, write_tags, TrackTags};
use super::transcoder::Transcoder;
use crate::error::{Error, Result};
use crate::queue::TaskQueue;
use chrono::Utc;
use flacrec_common::events::{EventBus, JobOutcomeKind, RecorderEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// What happened to a job that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Converted {
        destination: PathBuf,
        art_embedded: bool,
    },
    Skipped {
        destination: PathBuf,
    },
}

impl JobOutcome {
    pub fn kind(&self) -> JobOutcomeKind {
        match self {
            JobOutcome::Converted {
                art_embedded: true, ..
            } => JobOutcomeKind::ConvertedWithArt,
            JobOutcome::Converted { .. } => JobOutcomeKind::Converted,
            JobOutcome::Skipped { .. } => JobOutcomeKind::Skipped,
        }
    }
}

/// Stateless per-job processing shared by all workers
pub struct ConversionPipeline {
    output_dir: PathBuf,
    transcoder: Arc<dyn Transcoder>,
    artwork: ArtworkFetcher,
    /// Runtime that drives art downloads from worker threads
    runtime: Handle,
}

impl ConversionPipeline {
    pub fn new(
        output_dir: PathBuf,
        transcoder: Arc<dyn Transcoder>,
        artwork: ArtworkFetcher,
        runtime: Handle,
    ) -> Self {
        Self {
            output_dir,
            transcoder,
            artwork,
            runtime,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one job to completion
    ///
    /// Transcode or tag failures keep the temp capture for a later retry. Art
    /// failures do not: the job still counts as converted.
    ///
    /// Must be called from outside the tokio runtime (a worker thread).
    pub fn process(&self, job: &ConversionJob) -> Result<JobOutcome> {
        let destination = job.destination(&self.output_dir);

        if destination.exists() {
            info!(
                "File {} already exists, skipping conversion",
                destination.display()
            );
            remove_file_logged(&job.temp_file, "temp capture");
            return Ok(JobOutcome::Skipped { destination });
        }

        if !job.temp_file.exists() {
            return Err(Error::Conversion {
                path: job.temp_file.clone(),
                reason: "temp capture is missing".to_string(),
            });
        }

        self.transcoder.transcode(&job.temp_file, &destination)?;

        let tags = TrackTags {
            artist: job.artist.clone(),
            title: job.title.clone(),
            album: job.album.clone(),
        };
        if let Err(e) = write_tags(&destination, &tags) {
            // Untagged output must not satisfy the duplicate guard
            remove_file_logged(&destination, "untagged output");
            return Err(e);
        }

        let art_embedded = if job.art_url.is_empty() {
            false
        } else {
            match self.attach_artwork(job, &destination) {
                Ok(()) => true,
                Err(e) => {
                    warn!("No cover art for {}: {}", job.base_name, e);
                    false
                }
            }
        };

        // Cover art is optional: a tagged FLAC already holds the audio
        remove_file_logged(&job.temp_file, "temp capture");

        Ok(JobOutcome::Converted {
            destination,
            art_embedded,
        })
    }

    fn attach_artwork(&self, job: &ConversionJob, destination: &Path) -> Result<()> {
        let cover = self.runtime.block_on(self.artwork.fetch(&job.art_url))?;
        let art_file = cover.save(&self.output_dir, &job.base_name)?;

        let result = embed_cover(destination, cover.data, &cover.mime_type);

        if job.clean_art_file {
            remove_file_logged(&art_file, "art file");
        } else {
            debug!("Kept art file {}", art_file.display());
        }

        result
    }
}

/// Marks the popped job done when dropped, even if processing panics
struct DoneGuard<'a, T>(&'a TaskQueue<T>);

impl<T> Drop for DoneGuard<'_, T> {
    fn drop(&mut self) {
        self.0.task_done();
    }
}

/// Pool of conversion worker threads
pub struct Consumer {
    queue: Arc<TaskQueue<ConversionJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl Consumer {
    /// Start `worker_count` workers (at least one)
    ///
    /// With one worker, jobs finish in the order they were queued. With more,
    /// they are only started in that order.
    pub fn spawn(
        queue: Arc<TaskQueue<ConversionJob>>,
        pipeline: Arc<ConversionPipeline>,
        events: EventBus,
        worker_count: usize,
    ) -> Self {
        let workers = (0..worker_count.max(1))
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let pipeline = Arc::clone(&pipeline);
                let events = events.clone();
                thread::Builder::new()
                    .name(format!("convert-{}", worker_id))
                    .spawn(move || worker_loop(worker_id, queue, pipeline, events))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("Failed to start conversion worker: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        info!("Conversion consumer started with {} worker(s)", workers.len());

        Self { queue, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and join all workers
    ///
    /// Jobs still queued are processed first; call
    /// [`TaskQueue::drain`] beforehand to wait without closing.
    pub fn shutdown(self) {
        self.queue.close();
        for handle in self.workers {
            if handle.join().is_err() {
                error!("Conversion worker panicked");
            }
        }
        info!("Conversion consumer stopped");
    }
}

fn worker_loop(
    worker_id: usize,
    queue: Arc<TaskQueue<ConversionJob>>,
    pipeline: Arc<ConversionPipeline>,
    events: EventBus,
) {
    debug!(worker_id, "Conversion worker started");

    while let Some(job) = queue.pop() {
        let _done = DoneGuard(queue.as_ref());

        info!(worker_id, "Converting {}", job.base_name);

        match pipeline.process(&job) {
            Ok(outcome) => {
                if let JobOutcome::Converted { destination, art_embedded } = &outcome {
                    info!(
                        art = art_embedded,
                        "Converted {}",
                        destination.display()
                    );
                }
                events.emit_lossy(RecorderEvent::JobCompleted {
                    base_name: job.base_name.clone(),
                    outcome: outcome.kind(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                error!(
                    "Conversion of {} failed, keeping {}: {}",
                    job.base_name,
                    job.temp_file.display(),
                    e
                );
                events.emit_lossy(RecorderEvent::JobFailed {
                    base_name: job.base_name.clone(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    debug!(worker_id, "Conversion worker exiting");
}

fn remove_file_logged(path: &Path, what: &str) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {} {}", what, path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {} {}: {}", what, path.display(), e),
    }
}
