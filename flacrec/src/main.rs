//! flacrec - Main entry point
//!
//! Records the player's output track by track until interrupted, then waits
//! for every pending conversion before exiting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flacrec::config::{CliOverrides, Config};
use flacrec::Recorder;
use flacrec_common::config::TomlConfig;
use flacrec_common::EventBus;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for flacrec
#[derive(Parser, Debug)]
#[command(name = "flacrec")]
#[command(about = "Record a streaming player's output to tagged FLAC files, one file per track")]
#[command(version)]
struct Args {
    /// Player API base URL, http://host:port [default: http://127.0.0.1:47836]
    #[arg(short, long, env = "FLACREC_PLAYER_URL")]
    url: Option<String>,

    /// Drive the player without capturing audio (interface check)
    #[arg(long)]
    check: bool,

    /// Keep downloaded cover art files next to the recordings
    #[arg(long)]
    art_file: bool,

    /// Album tag written to every recording
    #[arg(short, long, env = "FLACREC_ALBUM")]
    album: Option<String>,

    /// Directory for finished FLAC files
    #[arg(short, long, env = "FLACREC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Configuration file [default: ~/.config/flacrec/config.toml]
    #[arg(short, long, env = "FLACREC_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path =
        TomlConfig::locate(args.config.as_deref()).context("Failed to find configuration file")?;
    let file_config = match &config_path {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("flacrec={}", file_config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting flacrec {}", env!("FLACREC_BUILD_INFO"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }

    let cli = CliOverrides {
        player_url: args.url,
        output_dir: args.output_dir,
        album: args.album,
        keep_art: args.art_file,
        check: args.check,
    };
    let config = Config::resolve(&cli, file_config).context("Invalid configuration")?;

    info!("Player: {}", config.player_url);
    info!("Output directory: {}", config.output_dir.display());
    if config.temp_dir != config.output_dir {
        info!("Temp directory: {}", config.temp_dir.display());
    }
    if !config.default_album.is_empty() {
        info!("Album: {}", config.default_album);
    }

    let recorder =
        Recorder::new(&config, EventBus::default()).context("Failed to initialize recorder")?;

    recorder
        .run_until(shutdown_signal())
        .await
        .context("Recorder failed")?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
