//! Capture launcher fake
//!
//! Writes a placeholder temp file on launch instead of running a capture
//! program, and records `start <file>` / `stop <file>` in the [`Journal`].

use super::Journal;
use flacrec::recording::{CaptureHandle, CaptureLauncher};
use flacrec::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeLauncher {
    journal: Journal,
    fail: Arc<AtomicBool>,
    launches: Arc<AtomicUsize>,
    temp_files: Arc<Mutex<Vec<PathBuf>>>,
    current_alive: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

impl FakeLauncher {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    /// Make subsequent launches fail
    pub fn fail_launches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Simulate the running capture process dying on its own
    pub fn crash_current(&self) {
        if let Some(alive) = self.current_alive.lock().unwrap().as_ref() {
            alive.store(false, Ordering::SeqCst);
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Temp files of every launch, in order
    pub fn temp_files(&self) -> Vec<PathBuf> {
        self.temp_files.lock().unwrap().clone()
    }
}

impl CaptureLauncher for FakeLauncher {
    fn launch(&self, output: &Path) -> Result<Box<dyn CaptureHandle>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Capture("fake capture device unavailable".to_string()));
        }

        std::fs::write(output, b"RIFF fake capture")?;

        self.launches.fetch_add(1, Ordering::SeqCst);
        self.temp_files.lock().unwrap().push(output.to_path_buf());
        self.journal.record(format!("start {}", file_name(output)));

        let alive = Arc::new(AtomicBool::new(true));
        *self.current_alive.lock().unwrap() = Some(Arc::clone(&alive));

        Ok(Box::new(FakeCapture {
            output: output.to_path_buf(),
            journal: self.journal.clone(),
            alive,
        }))
    }
}

struct FakeCapture {
    output: PathBuf,
    journal: Journal,
    alive: Arc<AtomicBool>,
}

impl CaptureHandle for FakeCapture {
    fn signal_stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.journal.record(format!("stop {}", file_name(&self.output)));
    }

    fn is_alive(&mut self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
