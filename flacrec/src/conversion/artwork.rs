//! Cover art download

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Downloaded cover image
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    /// Sniffed from the bytes, e.g. `image/jpeg`
    pub mime_type: String,
    /// Matching file extension, e.g. `jpg`
    pub extension: String,
}

impl CoverArt {
    /// Identify image bytes; anything that is not an image is rejected
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let kind = infer::get(&data)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| Error::Artwork("downloaded data is not an image".to_string()))?;

        Ok(Self {
            mime_type: kind.mime_type().to_string(),
            extension: kind.extension().to_string(),
            data,
        })
    }

    /// Write the image as `<dir>/<base_name>.<ext>`
    pub fn save(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{}.{}", base_name, self.extension));
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }
}

/// HTTP client for cover art URLs
#[derive(Debug, Clone)]
pub struct ArtworkFetcher {
    http_client: reqwest::Client,
}

impl ArtworkFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Artwork(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    pub async fn fetch(&self, url: &str) -> Result<CoverArt> {
        debug!(url = %url, "Fetching cover art");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Artwork(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Artwork(format!("{} returned {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Artwork(format!("reading {} failed: {}", url, e)))?;

        CoverArt::from_bytes(bytes.to_vec())
    }
}
