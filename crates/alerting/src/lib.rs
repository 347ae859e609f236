//! Alerting System
//!
//! Plays the audible drowsiness alert with volume control, cooldown
//! rate-limiting and overlap protection. Audio output is pluggable.

mod manager;
mod sink;

pub use manager::{SoundAlertManager, SoundConfig, MAX_COOLDOWN_MS, MIN_COOLDOWN_MS};
pub use sink::{AlertSink, SilentSink, TerminalBell};

use thiserror::Error;

/// Sound output errors
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("Audio device unavailable: {0}")]
    Device(String),

    #[error("Playback failed: {0}")]
    Playback(String),
}
