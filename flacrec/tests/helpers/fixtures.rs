//! File fixtures and a scripted transcoder

use flacrec::config::Config;
use flacrec::conversion::Transcoder;
use flacrec::{Error, Result};
use flacrec_common::config::{CaptureConfig, ConversionConfig, MonitorConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 1x1 transparent PNG
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Smallest FLAC lofty accepts: the marker plus a single STREAMINFO block
///
/// 44.1 kHz, 2 channels, 16 bits, zero samples.
pub fn minimal_flac() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(42);
    bytes.extend_from_slice(b"fLaC");

    // Last-metadata-block flag set, type 0 (STREAMINFO), length 34
    bytes.push(0x80);
    bytes.extend_from_slice(&[0x00, 0x00, 34]);

    // Min/max block size
    bytes.extend_from_slice(&4096u16.to_be_bytes());
    bytes.extend_from_slice(&4096u16.to_be_bytes());
    // Min/max frame size (unknown)
    bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    // Sample rate (20 bits), channels - 1 (3), bits per sample - 1 (5), total samples (36)
    let packed: u64 = (44_100u64 << 44) | (1u64 << 41) | (15u64 << 36);
    bytes.extend_from_slice(&packed.to_be_bytes());

    // MD5 signature (unset)
    bytes.extend_from_slice(&[0u8; 16]);

    bytes
}

/// Transcoder that writes [`minimal_flac`] instead of running ffmpeg
#[derive(Default)]
pub struct FakeTranscoder {
    fail: AtomicBool,
    delay: Duration,
    sources: Mutex<Vec<PathBuf>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Every transcode takes at least `delay`
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// Sources transcoded so far, in order
    pub fn sources(&self) -> Vec<PathBuf> {
        self.sources.lock().unwrap().clone()
    }
}

impl Transcoder for FakeTranscoder {
    fn transcode(&self, source: &Path, destination: &Path) -> Result<()> {
        std::thread::sleep(self.delay);
        self.sources.lock().unwrap().push(source.to_path_buf());

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Conversion {
                path: source.to_path_buf(),
                reason: "fake encoder failure".to_string(),
            });
        }

        std::fs::write(destination, minimal_flac())?;
        Ok(())
    }
}

/// Resolved configuration with fast timings for tests
pub fn test_config(output_dir: &Path, player_url: &str) -> Config {
    Config {
        player_url: player_url.to_string(),
        output_dir: output_dir.to_path_buf(),
        temp_dir: output_dir.to_path_buf(),
        default_album: String::new(),
        clean_art_file: true,
        check_mode: false,
        capture: CaptureConfig::default(),
        conversion: ConversionConfig {
            art_timeout_ms: 2_000,
            ..Default::default()
        },
        monitor: MonitorConfig {
            poll_interval_ms: 20,
            settle_delay_ms: 10,
            heartbeat_ticks: 120,
            request_timeout_ms: 1_000,
        },
        log_level: "debug".to_string(),
    }
}
