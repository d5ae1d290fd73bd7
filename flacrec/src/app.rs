//! Component wiring and shutdown sequence

use crate::config::Config;
use crate::conversion::{
    ArtworkFetcher, Consumer, ConversionJob, ConversionPipeline, FfmpegTranscoder, Transcoder,
};
use crate::error::{Error, Result};
use crate::monitor::{MonitorSettings, PlaybackMonitor};
use crate::player::PlayerClient;
use crate::queue::TaskQueue;
use crate::recording::{
    ArecordLauncher, CaptureLauncher, ControllerSettings, NullLauncher, RecordingController,
};
use flacrec_common::events::EventBus;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{error, info};

/// The assembled recorder: monitor, controller, queue and consumer
pub struct Recorder {
    monitor: PlaybackMonitor,
    queue: Arc<TaskQueue<ConversionJob>>,
    consumer: Consumer,
}

impl Recorder {
    /// Build the production recorder from resolved configuration
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: &Config, events: EventBus) -> Result<Self> {
        let launcher: Box<dyn CaptureLauncher> = if config.check_mode {
            info!("Interface check mode: no audio will be captured");
            Box::new(NullLauncher)
        } else {
            Box::new(ArecordLauncher::new(&config.capture))
        };
        let transcoder = Arc::new(FfmpegTranscoder::new(config.conversion.ffmpeg.clone()));

        Self::with_parts(config, events, launcher, transcoder)
    }

    /// Build a recorder around the given capture and transcode backends
    pub fn with_parts(
        config: &Config,
        events: EventBus,
        launcher: Box<dyn CaptureLauncher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self> {
        for dir in [&config.output_dir, &config.temp_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Config(format!("Cannot create directory {}: {}", dir.display(), e))
            })?;
        }

        let queue = Arc::new(TaskQueue::new());

        let artwork =
            ArtworkFetcher::new(Duration::from_millis(config.conversion.art_timeout_ms))?;
        let pipeline = Arc::new(ConversionPipeline::new(
            config.output_dir.clone(),
            transcoder,
            artwork,
            Handle::current(),
        ));
        let consumer = Consumer::spawn(
            Arc::clone(&queue),
            pipeline,
            events.clone(),
            config.conversion.workers,
        );

        let controller = RecordingController::new(
            launcher,
            Arc::clone(&queue),
            events.clone(),
            ControllerSettings {
                temp_dir: config.temp_dir.clone(),
                output_dir: config.output_dir.clone(),
                default_album: config.default_album.clone(),
                clean_art_file: config.clean_art_file,
            },
        );

        let player = PlayerClient::new(
            &config.player_url,
            Duration::from_millis(config.monitor.request_timeout_ms),
        )?;
        let monitor = PlaybackMonitor::new(
            player,
            controller,
            events,
            MonitorSettings::from(&config.monitor),
        );

        Ok(Self {
            monitor,
            queue,
            consumer,
        })
    }

    pub fn queue(&self) -> &Arc<TaskQueue<ConversionJob>> {
        &self.queue
    }

    /// Record until `shutdown` resolves, then wait for every queued conversion
    ///
    /// Shutdown order: stop polling, stop and queue the active capture,
    /// drain the queue, stop the workers.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            mut monitor,
            queue,
            consumer,
            ..
        } = self;

        if let Err(e) = monitor.begin().await {
            error!("Could not start recording: {}", e);
            stop_consumer(queue, consumer).await;
            return Err(e);
        }

        monitor.run(shutdown).await;
        monitor.finish();

        stop_consumer(queue, consumer).await;
        info!("Recorder stopped");
        Ok(())
    }
}

async fn stop_consumer(queue: Arc<TaskQueue<ConversionJob>>, consumer: Consumer) {
    let pending = queue.unfinished();
    if pending > 0 {
        info!("Waiting for {} conversion(s) to finish", pending);
    }

    let joined = tokio::task::spawn_blocking(move || {
        queue.drain();
        consumer.shutdown();
    })
    .await;

    if let Err(e) = joined {
        error!("Conversion shutdown task failed: {}", e);
    }
}
