//! Runtime configuration for flacrec
//!
//! Settings are resolved once at startup, in priority order:
//!
//! 1. Command-line arguments (each also readable from its environment variable)
//! 2. TOML configuration file
//! 3. Built-in defaults
//!
//! The output directory has no default and must come from one of the first
//! two sources.

use crate::error::{Error, Result};
use flacrec_common::config::{
    resolve_output_dir, CaptureConfig, ConversionConfig, MonitorConfig, TomlConfig,
    DEFAULT_PLAYER_URL, OUTPUT_DIR_ENV,
};
use reqwest::Url;
use std::path::PathBuf;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub player_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub album: Option<String>,
    /// Keep downloaded art files next to the recordings
    pub keep_art: bool,
    /// Interface-check mode: poll and drive the player, capture nothing
    pub check: bool,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Player base URL without trailing slash
    pub player_url: String,
    pub output_dir: PathBuf,
    /// Where captures are written while recording
    pub temp_dir: PathBuf,
    pub default_album: String,
    /// Delete downloaded art after embedding
    pub clean_art_file: bool,
    pub check_mode: bool,
    pub capture: CaptureConfig,
    pub conversion: ConversionConfig,
    pub monitor: MonitorConfig,
    pub log_level: String,
}

impl Config {
    pub fn resolve(cli: &CliOverrides, file: TomlConfig) -> Result<Self> {
        let output_dir = resolve_output_dir(cli.output_dir.as_deref(), OUTPUT_DIR_ENV, &file)?;

        let player_url = cli
            .player_url
            .as_deref()
            .or(file.player_url.as_deref())
            .unwrap_or(DEFAULT_PLAYER_URL);
        let player_url = validate_player_url(player_url)?;

        let default_album = cli
            .album
            .clone()
            .or(file.default_album)
            .unwrap_or_default();

        let temp_dir = file
            .capture
            .temp_dir
            .clone()
            .unwrap_or_else(|| output_dir.clone());

        Ok(Self {
            player_url,
            output_dir,
            temp_dir,
            default_album,
            clean_art_file: !(cli.keep_art || file.keep_art),
            check_mode: cli.check,
            capture: file.capture,
            conversion: file.conversion,
            monitor: file.monitor,
            log_level: file.logging.level,
        })
    }
}

/// Check that `url` has the form `http://host:port`
///
/// Returns the URL without a trailing slash.
pub fn validate_player_url(url: &str) -> Result<String> {
    let invalid = |reason: &str| {
        Error::Config(format!(
            "Invalid player URL '{}': {} (expected http://host:port)",
            url, reason
        ))
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;

    if parsed.scheme() != "http" {
        return Err(invalid("scheme must be http"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    // Url drops an explicit default port, so ":80" is checked textually
    let trimmed = url.trim_end_matches('/');
    if parsed.port().is_none() && !trimmed.ends_with(":80") {
        return Err(invalid("missing port"));
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not contain a path"));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("must not contain credentials"));
    }

    Ok(trimmed.to_string())
}
