//! Conversion job record

use crate::player::TrackSnapshot;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Extension of finished recordings
pub const OUTPUT_EXTENSION: &str = "flac";

/// Post-processing work for one finished capture
///
/// Created by the recording controller when a track ends, consumed exactly
/// once by a conversion worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    /// Raw capture written by the capture process
    pub temp_file: PathBuf,

    /// Output file name without extension
    pub base_name: String,

    /// Cover art URL (empty = no art)
    pub art_url: String,

    pub artist: String,
    pub title: String,

    /// Album tag override (empty = no album tag)
    pub album: String,

    /// Delete the downloaded art file after embedding
    pub clean_art_file: bool,

    pub queued_at: DateTime<Utc>,
}

impl ConversionJob {
    /// Build a job from the metadata of the track that just finished
    pub fn from_snapshot(
        temp_file: PathBuf,
        finished: &TrackSnapshot,
        default_album: &str,
        clean_art_file: bool,
    ) -> Self {
        Self {
            temp_file,
            base_name: finished.base_name(),
            art_url: finished.image.clone(),
            artist: finished.artist.clone(),
            title: finished.title.clone(),
            album: default_album.to_string(),
            clean_art_file,
            queued_at: Utc::now(),
        }
    }

    /// Final FLAC path inside `output_dir`
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        destination_for(output_dir, &self.base_name)
    }
}

/// `<output_dir>/<base_name>.flac`
pub fn destination_for(output_dir: &Path, base_name: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", base_name, OUTPUT_EXTENSION))
}
