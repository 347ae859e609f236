//! Audio output backends

use crate::SoundError;
use std::io::Write;
use tracing::debug;

/// Audio output driven by the sound alert manager
pub trait AlertSink: Send {
    /// Start playing the alert sound from the beginning
    fn play(&mut self, volume: f32) -> Result<(), SoundError>;

    /// Silence the sound if it is playing
    fn stop(&mut self);

    /// Whether the last started playback has run to completion
    fn is_finished(&self) -> bool;
}

impl<S: AlertSink + ?Sized> AlertSink for Box<S> {
    fn play(&mut self, volume: f32) -> Result<(), SoundError> {
        (**self).play(volume)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// Rings the terminal bell on stderr
///
/// A bell has no duration, so playback completes immediately. Zero volume
/// keeps the terminal quiet.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AlertSink for TerminalBell {
    fn play(&mut self, volume: f32) -> Result<(), SoundError> {
        if volume <= 0.0 {
            return Ok(());
        }
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| SoundError::Device(e.to_string()))
    }

    fn stop(&mut self) {}

    fn is_finished(&self) -> bool {
        true
    }
}

/// Headless sink that only counts what it was asked to do
#[derive(Debug, Default)]
pub struct SilentSink {
    plays: u64,
    stops: u64,
    last_volume: Option<f32>,
}

impl SilentSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of playbacks started
    pub fn plays(&self) -> u64 {
        self.plays
    }

    /// Number of stop requests
    pub fn stops(&self) -> u64 {
        self.stops
    }

    /// Volume of the most recent playback
    pub fn last_volume(&self) -> Option<f32> {
        self.last_volume
    }
}

impl AlertSink for SilentSink {
    fn play(&mut self, volume: f32) -> Result<(), SoundError> {
        debug!("Silent alert at volume {:.2}", volume);
        self.plays += 1;
        self.last_volume = Some(volume);
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn is_finished(&self) -> bool {
        true
    }
}
