//! HTTP client for the player's control API
//!
//! Endpoints (all `GET`, relative to the configured base URL):
//! - `/current` → JSON playback status
//! - `/play`, `/pause` → transport control, no body

use super::snapshot::TrackSnapshot;
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Status poll failures
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}")]
    Api(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Transport control failures
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{action} request failed: {reason}")]
    Network { action: &'static str, reason: String },

    #[error("{action} rejected with status {status}")]
    Api { action: &'static str, status: u16 },
}

/// Player API client
#[derive(Debug, Clone)]
pub struct PlayerClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl PlayerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll the current playback status
    ///
    /// `Ok(None)` means the player answered but reported nothing playing.
    pub async fn current(&self) -> std::result::Result<Option<TrackSnapshot>, PollError> {
        let url = format!("{}/current", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| PollError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Api(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PollError::Parse(e.to_string()))?;

        Ok(TrackSnapshot::from_json(&body))
    }

    /// Resume playback
    pub async fn play(&self) -> std::result::Result<(), ControlError> {
        self.control("play").await
    }

    /// Pause playback
    pub async fn pause(&self) -> std::result::Result<(), ControlError> {
        self.control("pause").await
    }

    async fn control(&self, action: &'static str) -> std::result::Result<(), ControlError> {
        let url = format!("{}/{}", self.base_url, action);
        debug!(url = %url, "Sending transport control");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ControlError::Network {
                action,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Api {
                action,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
