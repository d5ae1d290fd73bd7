//! Configuration file loading and output folder resolution
//!
//! The TOML file is optional. Every field has a built-in default except the
//! output directory, which must come from the command line, the environment
//! or the file.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default player API address (tidal-hifi's built-in API)
pub const DEFAULT_PLAYER_URL: &str = "http://127.0.0.1:47836";

/// Environment variable naming the output directory
pub const OUTPUT_DIR_ENV: &str = "FLACREC_OUTPUT_DIR";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Destination directory for finished FLAC files
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Player API base URL
    #[serde(default)]
    pub player_url: Option<String>,

    /// Album tag written when the player reports none
    #[serde(default)]
    pub default_album: Option<String>,

    /// Keep downloaded cover art next to the FLAC files
    #[serde(default)]
    pub keep_art: bool,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Capture process settings (arecord arguments)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_program")]
    pub program: String,

    /// ALSA device, e.g. `hw:0,1`
    #[serde(default = "default_capture_device")]
    pub device: String,

    /// Sample format, e.g. `S16_LE`
    #[serde(default = "default_sample_format")]
    pub sample_format: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Directory for in-progress captures (defaults to the output directory)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: default_capture_program(),
            device: default_capture_device(),
            sample_format: default_sample_format(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            temp_dir: None,
        }
    }
}

/// Conversion worker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Number of conversion workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Timeout for cover art downloads
    #[serde(default = "default_art_timeout_ms")]
    pub art_timeout_ms: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            workers: default_workers(),
            art_timeout_ms: default_art_timeout_ms(),
        }
    }
}

/// Playback monitor timing
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause between stopping one capture and starting the next
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Unchanged polls between "still playing" notices
    #[serde(default = "default_heartbeat_ticks")]
    pub heartbeat_ticks: u32,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            heartbeat_ticks: default_heartbeat_ticks(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_capture_program() -> String {
    "arecord".to_string()
}

fn default_capture_device() -> String {
    "hw:0,1".to_string()
}

fn default_sample_format() -> String {
    "S16_LE".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channels() -> u16 {
    2
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_art_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_heartbeat_ticks() -> u32 {
    120
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The file `load` would read, if any
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        Ok(default_config_path().filter(|path| path.exists()))
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.conversion.workers == 0 {
            return Err(Error::Config(
                "conversion.workers must be at least 1".to_string(),
            ));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(Error::Config(
                "monitor.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.capture.channels == 0 || self.capture.sample_rate == 0 {
            return Err(Error::Config(
                "capture.channels and capture.sample_rate must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/flacrec/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flacrec").join("config.toml"))
}

/// Output folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
///
/// There is no compiled default; a missing destination is a configuration error.
pub fn resolve_output_dir(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.output_dir {
        return Ok(path.clone());
    }

    Err(Error::Config(format!(
        "No output directory given (use --output-dir, {} or output_dir in the config file)",
        env_var_name
    )))
}
