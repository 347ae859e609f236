//! Display formatting of already computed numbers
//!
//! Nothing here feeds back into alert decisions; the detection service is
//! the only source of statistics.

use serde::Serialize;
use std::time::Duration;

use crate::detection::DetectionStats;

/// `"1h 2m 3s"`, hours omitted when zero
pub fn format_session_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

/// One decimal place
pub fn format_rate(value: f64) -> String {
    format!("{:.1}", value)
}

/// One decimal place with a percent sign
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Three decimal places
pub fn format_ear(value: f64) -> String {
    format!("{:.3}", value)
}

/// Statistics panel, ready to print
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub session_duration: String,
    pub drowsiness_events: String,
    pub blink_rate: String,
    pub drowsiness_percentage: String,
    pub average_ear: String,
}

impl StatsSummary {
    pub fn new(stats: &DetectionStats, elapsed: Duration) -> Self {
        Self {
            session_duration: format_session_duration(elapsed),
            drowsiness_events: stats.total_drowsiness_events.to_string(),
            blink_rate: format!("{}/min", format_rate(stats.average_blink_rate)),
            drowsiness_percentage: format_percentage(stats.drowsiness_percentage),
            average_ear: format_ear(stats.avg_ear),
        }
    }
}
