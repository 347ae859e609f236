//! Drowsiness Monitor
//!
//! Runs a monitoring session: acquires the camera, polls the detection
//! service at a fixed cadence, feeds results into the drowsiness state
//! machine and exposes snapshots, events and session commands.

mod camera;
mod config;
mod handle;
mod poller;
mod snapshot;

pub use config::{dms_config, sound_config, MonitorConfig};
pub use handle::{Monitor, MonitorHandle};
pub use poller::PollerStats;
pub use snapshot::{MonitorSnapshot, SessionExport};

use camera_capture::CameraError;
use dms::DmsError;
use session_store::StoreError;
use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Camera acquisition failed: {0}")]
    Acquisition(CameraError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] DmsError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Session store unavailable: {0}")]
    StoreLock(String),

    #[error("Monitoring loop is not running")]
    Stopped,

    #[error("Monitoring task failed: {0}")]
    Task(String),
}
