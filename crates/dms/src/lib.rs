//! Drowsiness Monitoring State Machine
//!
//! Turns the stream of per-poll detection results into client state:
//! - ALERT / DROWSY state with consecutive-drowsy debouncing
//! - Alert history and drowsy episodes
//! - Bounded EAR trend window
//! - Detection quality and last known overlays
//! - Alert side effects through an injected sound alert manager

pub mod analysis;
pub mod config;
pub mod detection;
pub mod display;
pub mod quotes;
pub mod state;
pub mod zen;

pub use analysis::MonitorEvent;
pub use config::DmsConfig;
pub use detection::{DetectionResult, DetectionStats, FaceBox, Point};
pub use state::{AlertRecord, AlertRun, DetectionQuality, MonitorState, SessionState};

use alerting::{AlertSink, SoundAlertManager};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Drowsiness state machine
///
/// Sole owner of the derived session state. Other components read it through
/// `state()` or clones of it.
pub struct DrowsinessStateMachine<S: AlertSink> {
    config: DmsConfig,
    sound: SoundAlertManager<S>,
    state: SessionState,
}

impl<S: AlertSink> DrowsinessStateMachine<S> {
    /// Create a state machine that raises alerts through `sound`
    pub fn new(config: DmsConfig, sound: SoundAlertManager<S>) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            config,
            sound,
            state: SessionState::default(),
        })
    }

    /// Apply one detection result
    pub fn apply(&mut self, result: &DetectionResult) -> Vec<MonitorEvent> {
        self.apply_at(result, Utc::now())
    }

    /// Apply one detection result observed at `at`
    pub fn apply_at(&mut self, result: &DetectionResult, at: DateTime<Utc>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        if result.is_drowsy {
            self.on_drowsy(at, &mut events);
        } else {
            self.on_alert(&mut events);
        }

        match result.ear() {
            Some(ear) => {
                self.state.push_ear(ear, self.config.ear_window_capacity);
                self.state.detection_quality = DetectionQuality::Good;
            }
            None => {
                self.state.detection_quality = DetectionQuality::None;
            }
        }

        // Overlays keep their last known value when a poll omits them
        if let Some(face_box) = &result.face_box {
            self.state.face_box = Some(face_box.clone());
        }
        if let Some(eye_markers) = &result.eye_markers {
            self.state.eye_markers = Some(eye_markers.clone());
        }

        self.state.stats = result.stats.clone();
        self.state.results_applied += 1;

        events
    }

    fn on_drowsy(&mut self, at: DateTime<Utc>, events: &mut Vec<MonitorEvent>) {
        let entering = self.state.monitor_state == MonitorState::Alert;
        if entering {
            self.state.monitor_state = MonitorState::Drowsy;
            self.state.episodes += 1;
            self.state.last_alert_time = Some(at);
        }

        self.state.consecutive_drowsy_count += 1;
        self.state.peak_consecutive_drowsy = self
            .state
            .peak_consecutive_drowsy
            .max(self.state.consecutive_drowsy_count);

        self.state.alert_history.push(AlertRecord {
            timestamp: at,
            duration_ms: self.config.sample_interval_ms,
            episode: self.state.episodes,
        });

        let sustained = self.state.consecutive_drowsy_count == self.config.consecutive_frames;
        if !entering && !sustained {
            debug!(
                "Still drowsy ({} consecutive)",
                self.state.consecutive_drowsy_count
            );
            return;
        }

        let sound_played = self.sound.play_alert();

        if entering {
            info!("Drowsiness detected (episode {})", self.state.episodes);
            events.push(MonitorEvent::DrowsinessDetected {
                episode: self.state.episodes,
                sound_played,
            });
        }
        if sustained {
            warn!(
                "Sustained drowsiness: {} consecutive drowsy results",
                self.state.consecutive_drowsy_count
            );
            events.push(MonitorEvent::SustainedDrowsiness {
                consecutive: self.state.consecutive_drowsy_count,
                quote: quotes::random_quote(),
                sound_played,
            });
        }
        if entering
            && self.config.auto_zen_mode
            && self.state.episodes % self.config.zen_episode_interval as u64 == 0
        {
            info!("Suggesting zen mode after {} episodes", self.state.episodes);
            events.push(MonitorEvent::ZenModeSuggested {
                episodes: self.state.episodes,
            });
        }
    }

    fn on_alert(&mut self, events: &mut Vec<MonitorEvent>) {
        let drowsy_polls = self.state.consecutive_drowsy_count;
        self.state.consecutive_drowsy_count = 0;

        if self.state.monitor_state == MonitorState::Drowsy {
            self.state.monitor_state = MonitorState::Alert;
            self.sound.stop();
            info!(
                "Alertness restored after {} drowsy results (episode {})",
                drowsy_polls, self.state.episodes
            );
            events.push(MonitorEvent::Recovered {
                episode: self.state.episodes,
                drowsy_polls,
            });
        }
    }

    /// Record a failed poll; nothing but the quality indicator changes
    pub fn mark_communication_failure(&mut self) {
        self.state.detection_quality = DetectionQuality::Poor;
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.state.reset();
        self.sound.clear();
        info!("Drowsiness state reset");
    }

    /// Replace the configuration, keeping derived state
    pub fn set_config(&mut self, config: DmsConfig) -> Result<(), DmsError> {
        config.validate()?;
        self.state.trim_ear_history(config.ear_window_capacity);
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn sound(&self) -> &SoundAlertManager<S> {
        &self.sound
    }

    /// Adjust volume / cooldown of the alert sound
    pub fn sound_mut(&mut self) -> &mut SoundAlertManager<S> {
        &mut self.sound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{SilentSink, SoundConfig};
    use proptest::prelude::*;

    fn machine(config: DmsConfig) -> DrowsinessStateMachine<SilentSink> {
        DrowsinessStateMachine::new(
            config,
            SoundAlertManager::new(SilentSink::new(), SoundConfig::default()),
        )
        .unwrap()
    }

    fn drowsy() -> DetectionResult {
        DetectionResult::new(true, Some(0.15))
    }

    fn awake() -> DetectionResult {
        DetectionResult::new(false, Some(0.3))
    }

    #[test]
    fn test_initial_state() {
        let m = machine(DmsConfig::default());
        let state = m.state();

        assert_eq!(state.monitor_state, MonitorState::Alert);
        assert!(state.ear_history.is_empty());
        assert!(state.alert_history.is_empty());
        assert_eq!(state.consecutive_drowsy_count, 0);
        assert_eq!(state.detection_quality, DetectionQuality::Good);
    }

    #[test]
    fn test_ten_poll_scenario() {
        let mut m = machine(DmsConfig::default());
        let mut peak = 0;

        for poll in 1..=10 {
            let result = if (3..=6).contains(&poll) { drowsy() } else { awake() };
            m.apply(&result);
            peak = peak.max(m.state().consecutive_drowsy_count);
        }

        let runs = m.state().alert_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].length, 4);
        assert_eq!(peak, 4);
        assert_eq!(m.state().peak_consecutive_drowsy, 4);
        assert_eq!(m.state().monitor_state, MonitorState::Alert);
        assert_eq!(m.state().consecutive_drowsy_count, 0);
    }

    #[test]
    fn test_alert_triggers_on_entry_and_threshold() {
        let mut m = machine(DmsConfig::default());

        let first = m.apply(&drowsy());
        assert!(matches!(first[..], [MonitorEvent::DrowsinessDetected { episode: 1, sound_played: true }]));

        assert!(m.apply(&drowsy()).is_empty());

        let third = m.apply(&drowsy());
        assert!(matches!(
            third[..],
            [MonitorEvent::SustainedDrowsiness { consecutive: 3, sound_played: false, .. }]
        ));

        // Level triggered: stays drowsy, no further alerts past the threshold
        assert!(m.apply(&drowsy()).is_empty());
        assert_eq!(m.state().consecutive_drowsy_count, 4);
        assert_eq!(m.sound().sink().plays(), 1);
    }

    #[test]
    fn test_single_frame_threshold_alerts_once() {
        let mut m = machine(DmsConfig {
            consecutive_frames: 1,
            ..Default::default()
        });

        let events = m.apply(&drowsy());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(MonitorEvent::is_alert));
        assert_eq!(m.sound().sink().plays(), 1);
    }

    #[test]
    fn test_recovery_silences_sound() {
        let mut m = machine(DmsConfig::default());
        m.apply(&drowsy());
        m.apply(&drowsy());

        let events = m.apply(&awake());
        assert_eq!(
            events,
            vec![MonitorEvent::Recovered { episode: 1, drowsy_polls: 2 }]
        );
        assert_eq!(m.sound().sink().stops(), 1);
        assert!(!m.sound().is_playing());

        // Already alert: nothing to report
        assert!(m.apply(&awake()).is_empty());
    }

    #[test]
    fn test_missing_ear_sets_quality_none() {
        let mut m = machine(DmsConfig::default());
        m.apply(&awake());
        let before = m.state().ear_history.clone();

        m.apply(&DetectionResult::new(false, None));
        assert_eq!(m.state().detection_quality, DetectionQuality::None);
        assert_eq!(m.state().ear_history, before);

        m.apply(&awake());
        assert_eq!(m.state().detection_quality, DetectionQuality::Good);
    }

    #[test]
    fn test_no_face_result_leaves_ear_window() {
        let mut m = machine(DmsConfig::default());
        m.apply(&awake());

        let no_face: DetectionResult = serde_json::from_str(
            r#"{"is_drowsy": false, "ear": 0.0, "face_detected": false, "stats": {}}"#,
        )
        .unwrap();
        m.apply(&no_face);

        assert_eq!(m.state().detection_quality, DetectionQuality::None);
        assert_eq!(m.state().ear_history, vec![0.3]);
    }

    #[test]
    fn test_communication_failure_only_touches_quality() {
        let mut m = machine(DmsConfig::default());
        m.apply(&drowsy());
        let before = m.state().clone();

        m.mark_communication_failure();
        let after = m.state();

        assert_eq!(after.detection_quality, DetectionQuality::Poor);
        assert_eq!(after.ear_history, before.ear_history);
        assert_eq!(after.alert_history, before.alert_history);
        assert_eq!(after.consecutive_drowsy_count, before.consecutive_drowsy_count);
        assert_eq!(after.monitor_state, before.monitor_state);
    }

    #[test]
    fn test_overlays_retain_last_known() {
        let mut m = machine(DmsConfig::default());
        let face = FaceBox { x: 1.0, y: 2.0, width: 3.0, height: 4.0 };
        let with_overlay = DetectionResult {
            face_box: Some(face.clone()),
            eye_markers: Some(vec![Point { x: 5.0, y: 6.0 }]),
            ..awake()
        };

        m.apply(&with_overlay);
        m.apply(&awake());

        assert_eq!(m.state().face_box, Some(face));
        assert_eq!(m.state().eye_markers.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_stats_replaced_as_is() {
        let mut m = machine(DmsConfig::default());
        let mut result = awake();
        result.stats.total_blinks = 12;
        result.stats.drowsiness_percentage = 8.5;
        m.apply(&result);
        assert_eq!(m.state().stats, result.stats);

        m.apply(&awake());
        assert_eq!(m.state().stats, DetectionStats::default());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut m = machine(DmsConfig::default());
        let mut result = drowsy();
        result.stats.total_drowsiness_events = 3;
        for _ in 0..5 {
            m.apply(&result);
        }
        m.mark_communication_failure();

        m.reset();
        let state = m.state();
        assert!(state.ear_history.is_empty());
        assert!(state.alert_history.is_empty());
        assert_eq!(state.consecutive_drowsy_count, 0);
        assert_eq!(state.monitor_state, MonitorState::Alert);
        assert_eq!(state.stats, DetectionStats::default());
        assert_eq!(state.last_alert_time, None);
        assert_eq!(state.episodes, 0);
        assert_eq!(state.detection_quality, DetectionQuality::Good);
    }

    #[test]
    fn test_auto_zen_every_third_episode() {
        let mut m = machine(DmsConfig {
            auto_zen_mode: true,
            ..Default::default()
        });

        let mut suggestions = 0;
        for _ in 0..6 {
            let events = m.apply(&drowsy());
            suggestions += events
                .iter()
                .filter(|e| matches!(e, MonitorEvent::ZenModeSuggested { .. }))
                .count();
            m.apply(&awake());
        }
        assert_eq!(suggestions, 2);
    }

    #[test]
    fn test_last_alert_time_marks_episode_start() {
        let mut m = machine(DmsConfig::default());
        let start = Utc::now();
        m.apply_at(&drowsy(), start);
        m.apply_at(&drowsy(), start + chrono::Duration::milliseconds(100));

        assert_eq!(m.state().last_alert_time, Some(start));
    }

    #[test]
    fn test_shrinking_window_trims_history() {
        let mut m = machine(DmsConfig::default());
        for _ in 0..20 {
            m.apply(&awake());
        }
        m.set_config(DmsConfig {
            ear_window_capacity: 5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(m.state().ear_history.len(), 5);
    }

    proptest! {
        #[test]
        fn prop_ear_window_holds_most_recent(
            samples in proptest::collection::vec(proptest::option::of(0.0f64..0.5), 0..200),
            capacity in 1usize..64,
        ) {
            let mut m = machine(DmsConfig { ear_window_capacity: capacity, ..Default::default() });
            let mut expected = Vec::new();

            for ear in &samples {
                m.apply(&DetectionResult::new(false, *ear));
                if let Some(v) = ear {
                    expected.push(*v);
                }
                prop_assert!(m.state().ear_history.len() <= capacity);
            }

            let start = expected.len().saturating_sub(capacity);
            let window: Vec<f64> = m.state().ear_history.iter().copied().collect();
            prop_assert_eq!(window, expected[start..].to_vec());
        }

        #[test]
        fn prop_consecutive_count_tracks_runs(flags in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut m = machine(DmsConfig::default());
            let mut previous = 0u32;

            for is_drowsy in flags {
                m.apply(&DetectionResult::new(is_drowsy, Some(0.2)));
                let count = m.state().consecutive_drowsy_count;
                if is_drowsy {
                    prop_assert_eq!(count, previous + 1);
                    prop_assert_eq!(m.state().monitor_state, MonitorState::Drowsy);
                } else {
                    prop_assert_eq!(count, 0);
                    prop_assert_eq!(m.state().monitor_state, MonitorState::Alert);
                }
                previous = count;
            }
        }
    }
}
