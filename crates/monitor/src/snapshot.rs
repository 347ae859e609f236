//! Read-only views of a monitoring session

use chrono::{DateTime, Utc};
use dms::{AlertRecord, AlertRun, DetectionStats, SessionState};
use serde::Serialize;
use session_store::{Session, Settings};

use crate::poller::PollerStats;

/// State published after every change
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub session_id: String,
    pub settings: Settings,
    pub state: SessionState,
    pub poller: PollerStats,
}

impl MonitorSnapshot {
    pub(crate) fn new(session: &Session, state: &SessionState) -> Self {
        Self {
            session_id: session.id.clone(),
            settings: session.settings.clone(),
            state: state.clone(),
            poller: PollerStats::default(),
        }
    }
}

/// Document written by a session export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    pub session: Session,
    pub exported_at: DateTime<Utc>,
    pub stats: DetectionStats,
    /// Most recent EAR samples, at most `dataRetention`
    pub ear_history: Vec<f64>,
    /// Most recent drowsy polls, at most `dataRetention`
    pub alert_history: Vec<AlertRecord>,
    pub alert_runs: Vec<AlertRun>,
    pub episodes: u64,
    pub poller: PollerStats,
}

impl SessionExport {
    pub fn new(session: &Session, snapshot: &MonitorSnapshot) -> Self {
        let retention = session.settings.data_retention;
        let state = &snapshot.state;

        let ear_skip = state.ear_history.len().saturating_sub(retention);
        let alert_skip = state.alert_history.len().saturating_sub(retention);

        Self {
            session: session.clone(),
            exported_at: Utc::now(),
            stats: state.stats.clone(),
            ear_history: state.ear_history.iter().skip(ear_skip).copied().collect(),
            alert_history: state.alert_history[alert_skip..].to_vec(),
            alert_runs: state.alert_runs(),
            episodes: state.episodes,
            poller: snapshot.poller.clone(),
        }
    }
}
