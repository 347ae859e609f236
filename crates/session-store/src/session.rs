//! Session and settings types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-configurable monitoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// EAR below which an eye counts as closed (used by the detection service)
    pub ear_threshold: f64,
    /// MAR above which the mouth counts as yawning
    pub mar_threshold: f64,
    /// Consecutive drowsy polls before the sustained alert fires
    pub consecutive_frames: u32,
    pub show_face_box: bool,
    pub show_eye_markers: bool,
    /// Suggest zen mode on repeated drowsiness
    pub auto_zen_mode: bool,
    /// Alert gain (0-1)
    pub alert_volume: f32,
    /// Minimum time between two audible alerts (ms)
    pub alert_cooldown: u64,
    /// Maximum number of historical samples kept for export
    pub data_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            mar_threshold: 0.5,
            consecutive_frames: 3,
            show_face_box: true,
            show_eye_markers: true,
            auto_zen_mode: false,
            alert_volume: 0.5,
            alert_cooldown: 3000,
            data_retention: 100,
        }
    }
}

/// Partial settings update; only present options are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mar_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutive_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_face_box: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_eye_markers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_zen_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_cooldown: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_retention: Option<usize>,
}

impl SettingsPatch {
    /// Merge the present options into `settings`
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.ear_threshold {
            settings.ear_threshold = v;
        }
        if let Some(v) = self.mar_threshold {
            settings.mar_threshold = v;
        }
        if let Some(v) = self.consecutive_frames {
            settings.consecutive_frames = v;
        }
        if let Some(v) = self.show_face_box {
            settings.show_face_box = v;
        }
        if let Some(v) = self.show_eye_markers {
            settings.show_eye_markers = v;
        }
        if let Some(v) = self.auto_zen_mode {
            settings.auto_zen_mode = v;
        }
        if let Some(v) = self.alert_volume {
            settings.alert_volume = v;
        }
        if let Some(v) = self.alert_cooldown {
            settings.alert_cooldown = v;
        }
        if let Some(v) = self.data_retention {
            settings.data_retention = v;
        }
    }

    /// Check whether the patch carries no options
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&Settings> for SettingsPatch {
    fn from(s: &Settings) -> Self {
        Self {
            ear_threshold: Some(s.ear_threshold),
            mar_threshold: Some(s.mar_threshold),
            consecutive_frames: Some(s.consecutive_frames),
            show_face_box: Some(s.show_face_box),
            show_eye_markers: Some(s.show_eye_markers),
            auto_zen_mode: Some(s.auto_zen_mode),
            alert_volume: Some(s.alert_volume),
            alert_cooldown: Some(s.alert_cooldown),
            data_retention: Some(s.data_retention),
        }
    }
}

/// Client session: identity plus settings bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Creation (or last reset) time, epoch milliseconds
    pub start_time: i64,
    #[serde(default)]
    pub settings: Settings,
}

impl Session {
    /// Create a fresh session with default settings
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time: Utc::now().timestamp_millis(),
            settings: Settings::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
