//! Request and response bodies

use serde::{Deserialize, Serialize};
use session_store::{Settings, SettingsPatch};

/// Body of `POST /detect`
#[derive(Debug, Serialize)]
pub(crate) struct DetectRequest<'a> {
    pub image: &'a str,
}

/// Settings in the service's snake_case form
///
/// The service only keeps the keys it knows, so every field is optional in
/// both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
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

impl From<&Settings> for RemoteSettings {
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

impl From<RemoteSettings> for SettingsPatch {
    fn from(r: RemoteSettings) -> Self {
        Self {
            ear_threshold: r.ear_threshold,
            mar_threshold: r.mar_threshold,
            consecutive_frames: r.consecutive_frames,
            show_face_box: r.show_face_box,
            show_eye_markers: r.show_eye_markers,
            auto_zen_mode: r.auto_zen_mode,
            alert_volume: r.alert_volume,
            alert_cooldown: r.alert_cooldown,
            data_retention: r.data_retention,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_settings_become_patch() {
        let json = r#"{
            "ear_threshold": 0.2,
            "mar_threshold": 0.3,
            "consecutive_frames": 3,
            "blink_threshold": 0.15,
            "yawn_threshold": 0.35,
            "show_face_box": true,
            "show_eye_markers": false,
            "auto_zen_mode": false
        }"#;
        let remote: RemoteSettings = serde_json::from_str(json).unwrap();
        let patch = SettingsPatch::from(remote);

        assert_eq!(patch.ear_threshold, Some(0.2));
        assert_eq!(patch.show_eye_markers, Some(false));
        assert_eq!(patch.alert_volume, None);
    }

    #[test]
    fn test_settings_serialize_snake_case() {
        let json = serde_json::to_value(RemoteSettings::from(&Settings::default())).unwrap();
        assert_eq!(json["consecutive_frames"], 3);
        assert_eq!(json["alert_cooldown"], 3000);
        assert!(json.get("earThreshold").is_none());
    }
}
