//! State machine configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Drowsiness state machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsConfig {
    /// Capacity of the EAR trend window (samples)
    pub ear_window_capacity: usize,

    /// Consecutive drowsy results before the sustained alert fires
    pub consecutive_frames: u32,

    /// Suggest zen mode on repeated drowsiness
    pub auto_zen_mode: bool,

    /// Drowsy episodes between two zen suggestions
    pub zen_episode_interval: u32,

    /// Poll interval recorded as the duration of each alert-history entry (ms)
    pub sample_interval_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_window_capacity: 50,
            consecutive_frames: 3,
            auto_zen_mode: false,
            zen_episode_interval: 3,
            sample_interval_ms: 100,
        }
    }
}

impl DmsConfig {
    /// Reject values the state machine cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.ear_window_capacity == 0 {
            return Err(DmsError::Config("ear_window_capacity must be at least 1".into()));
        }
        if self.consecutive_frames == 0 {
            return Err(DmsError::Config("consecutive_frames must be at least 1".into()));
        }
        if self.zen_episode_interval == 0 {
            return Err(DmsError::Config("zen_episode_interval must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DmsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = DmsConfig {
            ear_window_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DmsConfig {
            consecutive_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
