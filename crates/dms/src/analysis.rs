//! Side effects produced by the state machine

use serde::Serialize;

use crate::quotes::Quote;

/// Events emitted while applying detection results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Transition ALERT -> DROWSY
    DrowsinessDetected {
        episode: u64,
        /// Whether the alert sound was actually heard (cooldown may suppress it)
        sound_played: bool,
    },

    /// Drowsiness persisted for the configured number of polls
    SustainedDrowsiness {
        consecutive: u32,
        quote: Quote,
        sound_played: bool,
    },

    /// Transition DROWSY -> ALERT
    Recovered {
        episode: u64,
        /// Length of the drowsy run that just ended
        drowsy_polls: u32,
    },

    /// Repeated drowsiness with auto zen mode enabled
    ZenModeSuggested { episodes: u64 },
}

impl MonitorEvent {
    /// Whether this event represents an alert the user should see
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            MonitorEvent::DrowsinessDetected { .. } | MonitorEvent::SustainedDrowsiness { .. }
        )
    }

    /// Short notification text
    pub fn message(&self) -> String {
        match self {
            MonitorEvent::DrowsinessDetected { .. } => "Drowsiness detected! Stay alert!".to_string(),
            MonitorEvent::SustainedDrowsiness { quote, .. } => quote.text.to_string(),
            MonitorEvent::Recovered { .. } => "Alertness restored".to_string(),
            MonitorEvent::ZenModeSuggested { .. } => {
                "Repeated drowsiness - time for a zen break".to_string()
            }
        }
    }
}
