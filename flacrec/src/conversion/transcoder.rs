//! Raw capture → FLAC conversion

use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Converts a finished capture into the output container
pub trait Transcoder: Send + Sync {
    /// Write `destination` from `source`. On error no partial destination remains.
    fn transcode(&self, source: &Path, destination: &Path) -> Result<()>;
}

/// FFmpeg-based FLAC encoder
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to ffmpeg
    ///
    /// `-n` refuses to overwrite; the destination is checked beforehand.
    pub fn args(source: &Path, destination: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-n".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-c:a".to_string(),
            "flac".to_string(),
            destination.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, source: &Path, destination: &Path) -> Result<()> {
        debug!(
            "Encoding {} -> {}",
            source.display(),
            destination.display()
        );

        // Anything removed on failure below must be ours
        if destination.exists() {
            return Err(Error::Conversion {
                path: source.to_path_buf(),
                reason: format!("{} already exists", destination.display()),
            });
        }

        let mut command = Command::new(&self.program);
        command
            .args(Self::args(source, destination))
            .stdin(Stdio::null());

        // Own process group: a terminal Ctrl+C must not cut a conversion short
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let output = command
            .output()
            .map_err(|e| Error::Conversion {
                path: source.to_path_buf(),
                reason: format!("Failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            remove_partial(destination);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Conversion {
                path: source.to_path_buf(),
                reason: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
}
