//! Monitor configuration and settings mapping

use alerting::SoundConfig;
use camera_capture::CaptureConfig;
use dms::DmsConfig;
use session_store::Settings;
use std::time::Duration;

/// Configuration for a monitoring session
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between two detection polls (ms)
    pub poll_interval_ms: u64,
    /// Capacity of the EAR trend window
    pub ear_window_capacity: usize,
    /// Drowsy episodes between zen suggestions
    pub zen_episode_interval: u32,
    /// Frame upload encoding
    pub capture: CaptureConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            ear_window_capacity: 50,
            zen_episode_interval: 3,
            capture: CaptureConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// State machine configuration for the given user settings
pub fn dms_config(config: &MonitorConfig, settings: &Settings) -> DmsConfig {
    DmsConfig {
        ear_window_capacity: config.ear_window_capacity.max(1),
        consecutive_frames: settings.consecutive_frames.max(1),
        auto_zen_mode: settings.auto_zen_mode,
        zen_episode_interval: config.zen_episode_interval.max(1),
        sample_interval_ms: config.poll_interval_ms,
    }
}

/// Alert sound configuration for the given user settings
pub fn sound_config(settings: &Settings) -> SoundConfig {
    SoundConfig {
        volume: settings.alert_volume,
        cooldown_ms: settings.alert_cooldown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_settings_stay_usable() {
        let settings = Settings {
            consecutive_frames: 0,
            ..Default::default()
        };
        let config = MonitorConfig {
            ear_window_capacity: 0,
            ..Default::default()
        };
        assert!(dms_config(&config, &settings).validate().is_ok());
    }

    #[test]
    fn test_settings_flow_into_components() {
        let settings = Settings {
            consecutive_frames: 6,
            auto_zen_mode: true,
            alert_volume: 0.2,
            alert_cooldown: 4500,
            ..Default::default()
        };
        let dms = dms_config(&MonitorConfig::default(), &settings);
        assert_eq!(dms.consecutive_frames, 6);
        assert!(dms.auto_zen_mode);
        assert_eq!(dms.sample_interval_ms, 100);

        let sound = sound_config(&settings);
        assert_eq!(sound.cooldown_ms, 4500);
        assert_eq!(sound.volume, 0.2);
    }
}
