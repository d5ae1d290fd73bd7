//! Capture lifecycle: process handles and the recording controller

pub mod controller;
pub mod process;

pub use controller::{ControllerSettings, RecordingController, StopOutcome};
pub use process::{ArecordLauncher, CaptureHandle, CaptureLauncher, ChildCapture, NullLauncher};
