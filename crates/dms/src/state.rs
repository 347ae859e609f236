//! Derived session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::detection::{DetectionStats, FaceBox, Point};

/// Machine state, driven by the level of `is_drowsy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    #[default]
    Alert,
    Drowsy,
}

/// Client-observed quality of the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionQuality {
    /// EAR value received
    #[default]
    Good,
    /// Request or response failed
    Poor,
    /// Service answered but found no face
    None,
}

impl DetectionQuality {
    /// Human readable indicator text
    pub fn label(&self) -> &'static str {
        match self {
            DetectionQuality::Good => "Good Detection",
            DetectionQuality::Poor => "Poor Detection",
            DetectionQuality::None => "No Face Detected",
        }
    }
}

/// One drowsy poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: DateTime<Utc>,
    /// Time covered by the poll (ms)
    pub duration_ms: u64,
    /// Drowsy episode this poll belongs to
    pub episode: u64,
}

/// Contiguous run of drowsy polls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRun {
    pub episode: u64,
    pub started_at: DateTime<Utc>,
    /// Number of drowsy polls in the run
    pub length: usize,
    pub duration_ms: u64,
}

/// State derived from the stream of detection results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub monitor_state: MonitorState,

    /// Recent EAR samples, oldest first
    pub ear_history: VecDeque<f64>,

    pub consecutive_drowsy_count: u32,

    /// Highest consecutive count seen since the last reset
    pub peak_consecutive_drowsy: u32,

    /// One record per drowsy poll
    pub alert_history: Vec<AlertRecord>,

    pub detection_quality: DetectionQuality,

    /// Start of the most recent drowsy episode
    pub last_alert_time: Option<DateTime<Utc>>,

    /// Number of drowsy episodes since the last reset
    pub episodes: u64,

    /// Last known overlays
    pub face_box: Option<FaceBox>,
    pub eye_markers: Option<Vec<Point>>,

    /// Latest statistics from the detection service
    pub stats: DetectionStats,

    /// Results applied since the last reset
    pub results_applied: u64,
}

impl SessionState {
    /// Add an EAR sample, evicting the oldest beyond `capacity`
    pub fn push_ear(&mut self, ear: f64, capacity: usize) {
        self.ear_history.push_back(ear);
        self.trim_ear_history(capacity);
    }

    /// Drop the oldest samples until at most `capacity` remain
    pub fn trim_ear_history(&mut self, capacity: usize) {
        while self.ear_history.len() > capacity {
            self.ear_history.pop_front();
        }
    }

    pub fn is_drowsy(&self) -> bool {
        self.monitor_state == MonitorState::Drowsy
    }

    /// Group alert history into runs, one per drowsy episode
    pub fn alert_runs(&self) -> Vec<AlertRun> {
        let mut runs: Vec<AlertRun> = Vec::new();
        for record in &self.alert_history {
            match runs.last_mut() {
                Some(run) if run.episode == record.episode => {
                    run.length += 1;
                    run.duration_ms += record.duration_ms;
                }
                _ => runs.push(AlertRun {
                    episode: record.episode,
                    started_at: record.timestamp,
                    length: 1,
                    duration_ms: record.duration_ms,
                }),
            }
        }
        runs
    }

    /// Reset state (explicit session reset)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ear_window_evicts_oldest() {
        let mut state = SessionState::default();
        for i in 0..5 {
            state.push_ear(i as f64, 3);
        }
        assert_eq!(state.ear_history, VecDeque::from(vec![2.0, 3.0, 4.0]));

        state.trim_ear_history(1);
        assert_eq!(state.ear_history, VecDeque::from(vec![4.0]));
    }

    #[test]
    fn test_alert_runs_group_by_episode() {
        let now = Utc::now();
        let record = |episode| AlertRecord {
            timestamp: now,
            duration_ms: 100,
            episode,
        };

        let state = SessionState {
            alert_history: vec![record(1), record(1), record(2), record(2), record(2)],
            ..Default::default()
        };
        let runs = state.alert_runs();

        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].length, runs[0].duration_ms), (2, 200));
        assert_eq!((runs[1].episode, runs[1].length), (2, 3));
    }

    #[test]
    fn test_quality_serializes_lowercase() {
        let json = serde_json::to_string(&DetectionQuality::None).unwrap();
        assert_eq!(json, "\"none\"");
        assert_eq!(DetectionQuality::Poor.label(), "Poor Detection");
    }
}
