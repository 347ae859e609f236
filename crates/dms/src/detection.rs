//! Detection results as returned by the detection service

use serde::{Deserialize, Serialize};

/// Face bounding box in frame pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Eye landmark in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Aggregate statistics computed by the detection service
///
/// Accepts both the dashboard field names and the names the service uses
/// internally; anything missing stays zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionStats {
    #[serde(alias = "drowsy_count")]
    pub total_drowsiness_events: u64,
    #[serde(alias = "blink_count")]
    pub total_blinks: u64,
    /// Blinks per minute
    #[serde(alias = "blink_rate")]
    pub average_blink_rate: f64,
    /// Seconds since the server-side session started
    #[serde(alias = "duration")]
    pub session_duration: f64,
    pub drowsiness_percentage: f64,
    pub avg_ear: f64,
    pub avg_confidence: f64,
}

/// One poll's detection result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_drowsy: bool,

    /// Eye aspect ratio; absent when no face was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ear_value: Option<f64>,

    /// Eye aspect ratio under the service's own key; `ear_value` wins when
    /// both are sent
    #[serde(default, rename = "ear", skip_serializing_if = "Option::is_none")]
    pub service_ear: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_box: Option<FaceBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_markers: Option<Vec<Point>>,

    #[serde(default)]
    pub stats: DetectionStats,

    /// Mouth aspect ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mar: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detected: Option<bool>,

    /// Session the service attributed this frame to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl DetectionResult {
    /// Minimal result, handy for driving the state machine
    pub fn new(is_drowsy: bool, ear_value: Option<f64>) -> Self {
        Self {
            is_drowsy,
            ear_value,
            ..Default::default()
        }
    }

    /// Eye aspect ratio of this poll, `None` when no face was found.
    ///
    /// The service reports a missing face as `face_detected: false` with a
    /// placeholder EAR of zero.
    pub fn ear(&self) -> Option<f64> {
        if self.face_detected == Some(false) {
            return None;
        }
        self.ear_value.or(self.service_ear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dashboard_shape() {
        let json = r#"{
            "is_drowsy": true,
            "ear_value": 0.18,
            "face_box": {"x": 10, "y": 20, "width": 100, "height": 120},
            "eye_markers": [{"x": 30, "y": 40}, {"x": 70, "y": 40}],
            "stats": {"total_drowsiness_events": 4, "average_blink_rate": 0.3, "drowsiness_percentage": 12.5}
        }"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();

        assert!(result.is_drowsy);
        assert_eq!(result.ear_value, Some(0.18));
        assert_eq!(result.face_box.unwrap().width, 100.0);
        assert_eq!(result.eye_markers.unwrap().len(), 2);
        assert_eq!(result.stats.total_drowsiness_events, 4);
        assert_eq!(result.stats.total_blinks, 0);
    }

    #[test]
    fn test_decode_service_shape() {
        let json = r#"{
            "session_id": "20240101_120000",
            "is_drowsy": false,
            "ear": 0.31,
            "mar": 0.12,
            "confidence": 0.9,
            "face_detected": true,
            "stats": {"duration": 62.5, "blink_count": 14, "blink_rate": 13.4, "drowsy_count": 2, "avg_ear": 0.28}
        }"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.ear(), Some(0.31));
        assert_eq!(result.session_id.as_deref(), Some("20240101_120000"));
        assert_eq!(result.stats.total_blinks, 14);
        assert_eq!(result.stats.total_drowsiness_events, 2);
        assert_eq!(result.stats.session_duration, 62.5);
        assert!(result.face_box.is_none());
    }

    #[test]
    fn test_no_face_has_no_ear() {
        let json = r#"{"is_drowsy": false, "ear": 0.0, "face_detected": false, "stats": {}}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.service_ear, Some(0.0));
        assert_eq!(result.ear(), None);
    }

    #[test]
    fn test_both_ear_keys_prefer_ear_value() {
        let json = r#"{"is_drowsy": false, "ear_value": 0.27, "ear": 0.25}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.ear(), Some(0.27));
    }

    #[test]
    fn test_missing_is_drowsy_is_malformed() {
        assert!(serde_json::from_str::<DetectionResult>(r#"{"ear_value": 0.2}"#).is_err());
    }
}
