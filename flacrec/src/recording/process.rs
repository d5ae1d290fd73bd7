//! Capture process handles
//!
//! The recording controller only talks to these traits. The production
//! launcher runs `arecord`; interface-check mode uses [`NullLauncher`], and
//! tests substitute their own fakes.

use crate::error::{Error, Result};
use flacrec_common::config::CaptureConfig;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Time a signalled capture gets to exit before it is killed
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Poll interval of the reaper thread
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Starts capture processes
pub trait CaptureLauncher: Send {
    /// Begin capturing into `output` without waiting for the process
    fn launch(&self, output: &Path) -> Result<Box<dyn CaptureHandle>>;

    /// False when no real audio is captured (interface-check mode)
    fn captures_audio(&self) -> bool {
        true
    }
}

/// One running capture process
pub trait CaptureHandle: Send {
    /// Ask the process to finish. Best effort, never blocks, never fails.
    fn signal_stop(&mut self);

    fn is_alive(&mut self) -> bool;

    /// OS process id, if there is one
    fn pid(&self) -> Option<u32> {
        None
    }
}

/// Launches `arecord` with fixed device/format/rate/channel arguments
#[derive(Debug, Clone)]
pub struct ArecordLauncher {
    program: String,
    device: String,
    sample_format: String,
    sample_rate: u32,
    channels: u16,
}

impl ArecordLauncher {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            program: config.program.clone(),
            device: config.device.clone(),
            sample_format: config.sample_format.clone(),
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }

    /// Arguments passed to the capture program
    pub fn args(&self, output: &Path) -> Vec<String> {
        vec![
            "-q".to_string(),
            "-D".to_string(),
            self.device.clone(),
            "-f".to_string(),
            self.sample_format.clone(),
            "-r".to_string(),
            self.sample_rate.to_string(),
            "-c".to_string(),
            self.channels.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl CaptureLauncher for ArecordLauncher {
    fn launch(&self, output: &Path) -> Result<Box<dyn CaptureHandle>> {
        let child = Command::new(&self.program)
            .args(self.args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Capture(format!("Failed to start {}: {}", self.program, e)))?;

        info!(
            pid = child.id(),
            device = %self.device,
            "Capture process started: {}",
            output.display()
        );

        Ok(Box::new(ChildCapture::new(child)))
    }
}

/// Handle to a spawned capture child process
pub struct ChildCapture {
    child: Option<Child>,
    pid: u32,
}

impl ChildCapture {
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child: Some(child),
            pid,
        }
    }
}

impl CaptureHandle for ChildCapture {
    fn signal_stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = self.pid, %status, "Capture process had already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => debug!(pid = self.pid, "Could not query capture process: {}", e),
        }

        if !send_terminate(self.pid) {
            if let Err(e) = child.kill() {
                debug!(pid = self.pid, "Kill of capture process returned: {}", e);
            }
        }

        // Reap in the background so the caller never waits on the exit
        let pid = self.pid;
        thread::spawn(move || reap(child, pid));
    }

    fn is_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }
}

impl Drop for ChildCapture {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

/// SIGTERM lets arecord rewrite the WAV header before exiting
#[cfg(unix)]
fn send_terminate(pid: u32) -> bool {
    match Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) => status.success(),
        Err(e) => {
            debug!(pid, "kill -TERM failed: {}", e);
            false
        }
    }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32) -> bool {
    false
}

fn reap(mut child: Child, pid: u32) {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid, %status, "Capture process exited");
                return;
            }
            Ok(None) if started.elapsed() < STOP_GRACE_PERIOD => thread::sleep(REAP_POLL_INTERVAL),
            Ok(None) => {
                warn!(pid, "Capture process ignored SIGTERM, killing");
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            Err(e) => {
                warn!(pid, "Failed to collect capture process status: {}", e);
                return;
            }
        }
    }
}

/// Launcher that records nothing (interface-check mode)
#[derive(Debug, Clone, Default)]
pub struct NullLauncher;

impl CaptureLauncher for NullLauncher {
    fn launch(&self, output: &Path) -> Result<Box<dyn CaptureHandle>> {
        info!("Interface check: not capturing {}", output.display());
        Ok(Box::new(NullCapture { alive: true }))
    }

    fn captures_audio(&self) -> bool {
        false
    }
}

struct NullCapture {
    alive: bool,
}

impl CaptureHandle for NullCapture {
    fn signal_stop(&mut self) {
        self.alive = false;
    }

    fn is_alive(&mut self) -> bool {
        self.alive
    }
}
