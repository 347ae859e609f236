//! Sound Alert Manager Implementation

use crate::sink::AlertSink;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lowest accepted cooldown between alerts (ms)
pub const MIN_COOLDOWN_MS: u64 = 1000;

/// Highest accepted cooldown between alerts (ms)
pub const MAX_COOLDOWN_MS: u64 = 10_000;

/// Sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Playback gain (0-1)
    pub volume: f32,
    /// Minimum time between two playbacks (ms)
    pub cooldown_ms: u64,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            cooldown_ms: 3000,
        }
    }
}

/// Rate-limited alert player
///
/// Knows nothing about drowsiness; callers decide when an alert is due and
/// this manager decides whether it is actually heard.
pub struct SoundAlertManager<S: AlertSink> {
    sink: S,
    volume: f32,
    cooldown: Duration,
    /// Playback in progress; cleared by the sound's completion
    is_playing: bool,
    /// Time of the last successful playback
    last_play: Option<Instant>,
    play_count: u64,
}

impl<S: AlertSink> SoundAlertManager<S> {
    /// Create a manager around an audio sink
    pub fn new(sink: S, config: SoundConfig) -> Self {
        info!("Creating sound alert manager with config: {:?}", config);
        let mut manager = Self {
            sink,
            volume: 0.0,
            cooldown: Duration::from_millis(MIN_COOLDOWN_MS),
            is_playing: false,
            last_play: None,
            play_count: 0,
        };
        manager.set_volume(config.volume);
        manager.set_cooldown(config.cooldown_ms);
        manager
    }

    /// Play the alert unless still cooling down or already playing
    ///
    /// Returns whether a playback was actually started.
    pub fn play_alert(&mut self) -> bool {
        let now = Instant::now();

        if let Some(last) = self.last_play {
            let elapsed = now.duration_since(last);
            if elapsed <= self.cooldown {
                debug!(
                    "Alert suppressed: {}ms since last play, cooldown {}ms",
                    elapsed.as_millis(),
                    self.cooldown.as_millis()
                );
                return false;
            }
        }

        if self.is_playing && self.sink.is_finished() {
            self.is_playing = false;
        }
        if self.is_playing {
            debug!("Alert suppressed: previous playback still running");
            return false;
        }

        match self.sink.play(self.volume) {
            Ok(()) => {
                self.is_playing = true;
                self.last_play = Some(now);
                self.play_count += 1;
                info!("Alert played (count: {})", self.play_count);
                true
            }
            Err(e) => {
                warn!("Error playing alert sound: {}", e);
                false
            }
        }
    }

    /// Silence an ongoing playback
    pub fn stop(&mut self) {
        if self.is_playing {
            self.sink.stop();
            self.is_playing = false;
            debug!("Alert sound stopped");
        }
    }

    /// Completion event of the sound
    pub fn on_playback_ended(&mut self) {
        self.is_playing = false;
    }

    /// Set gain, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    /// Set cooldown, clamped to [MIN_COOLDOWN_MS, MAX_COOLDOWN_MS]
    pub fn set_cooldown(&mut self, cooldown_ms: u64) {
        let clamped = cooldown_ms.clamp(MIN_COOLDOWN_MS, MAX_COOLDOWN_MS);
        if clamped != cooldown_ms {
            warn!("Alert cooldown {}ms out of range, using {}ms", cooldown_ms, clamped);
        }
        self.cooldown = Duration::from_millis(clamped);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Number of playbacks actually started
    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    /// Access the audio sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Forget playback history (session reset)
    pub fn clear(&mut self) {
        self.stop();
        self.last_play = None;
        self.play_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SilentSink, SoundError};

    /// Sink whose playback runs until told to finish
    #[derive(Default)]
    struct LongSink {
        plays: u32,
        stops: u32,
        finished: bool,
        fail: bool,
    }

    impl AlertSink for LongSink {
        fn play(&mut self, _volume: f32) -> Result<(), SoundError> {
            if self.fail {
                return Err(SoundError::Playback("blocked".into()));
            }
            self.plays += 1;
            self.finished = false;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    fn manager(cooldown_ms: u64) -> SoundAlertManager<SilentSink> {
        SoundAlertManager::new(
            SilentSink::new(),
            SoundConfig {
                cooldown_ms,
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_suppresses_close_alerts() {
        let mut manager = manager(3000);

        assert!(manager.play_alert());
        tokio::time::advance(Duration::from_millis(2000)).await;
        assert!(!manager.play_alert());

        assert_eq!(manager.sink().plays(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_allows_spaced_alerts() {
        let mut manager = manager(3000);

        assert!(manager.play_alert());
        tokio::time::advance(Duration::from_millis(3100)).await;
        assert!(manager.play_alert());

        assert_eq!(manager.sink().plays(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_play_does_not_restart() {
        let mut manager = SoundAlertManager::new(LongSink::default(), SoundConfig::default());

        assert!(manager.play_alert());
        tokio::time::advance(Duration::from_millis(3500)).await;

        // Cooldown passed but the first sound never finished
        assert!(!manager.play_alert());
        assert_eq!(manager.sink().plays, 1);

        manager.on_playback_ended();
        assert!(manager.play_alert());
        assert_eq!(manager.sink().plays, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_silences_playback() {
        let mut manager = SoundAlertManager::new(LongSink::default(), SoundConfig::default());
        manager.play_alert();
        assert!(manager.is_playing());

        manager.stop();
        assert!(!manager.is_playing());
        assert_eq!(manager.sink().stops, 1);

        // Nothing to stop the second time
        manager.stop();
        assert_eq!(manager.sink().stops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_playback_does_not_start_cooldown() {
        let mut manager = SoundAlertManager::new(
            LongSink {
                fail: true,
                ..Default::default()
            },
            SoundConfig::default(),
        );

        assert!(!manager.play_alert());
        assert!(!manager.is_playing());
        assert_eq!(manager.play_count(), 0);
    }

    #[test]
    fn test_volume_and_cooldown_clamping() {
        let mut manager = manager(3000);

        manager.set_volume(1.7);
        assert_eq!(manager.volume(), 1.0);
        manager.set_volume(-0.2);
        assert_eq!(manager.volume(), 0.0);
        manager.set_volume(f32::NAN);
        assert_eq!(manager.volume(), 0.0);

        manager.set_cooldown(50);
        assert_eq!(manager.cooldown(), Duration::from_millis(MIN_COOLDOWN_MS));
        manager.set_cooldown(60_000);
        assert_eq!(manager.cooldown(), Duration::from_millis(MAX_COOLDOWN_MS));
        manager.set_cooldown(4200);
        assert_eq!(manager.cooldown(), Duration::from_millis(4200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_forgets_last_play() {
        let mut manager = manager(3000);
        assert!(manager.play_alert());
        manager.clear();
        assert!(manager.play_alert());
        assert_eq!(manager.play_count(), 1);
    }
}
