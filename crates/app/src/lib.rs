//! Drowsiness Monitor Application
//!
//! Wires configuration, logging, the session store, the detection client
//! and a frame source into a running monitoring session, and reports
//! alerts and statistics on the console.

mod app_config;

pub use app_config::{AppConfig, CONFIG_FILE, ENV_PREFIX};

use alerting::{AlertSink, SilentSink, TerminalBell};
use camera_capture::ImageDirSource;
use chrono::Utc;
use detection_client::{ClientError, DetectionApi, DetectionClient};
use dms::display::StatsSummary;
use dms::zen::{BreathingCycle, BreathingPhase};
use dms::MonitorEvent;
use monitor::{Monitor, MonitorError, MonitorHandle, MonitorSnapshot};
use session_store::SessionStore;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Initialize logging; `RUST_LOG` wins over the configured level
pub fn init_logging(level: &str, json: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| AppError::Logging(e.to_string()))
}

/// Run a monitoring session until Ctrl-C
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let client = DetectionClient::new(config.client_config())?;
    let store = match &config.storage_dir {
        Some(dir) => SessionStore::open(dir),
        None => SessionStore::in_memory(),
    };
    let monitor = Monitor::new(config.monitor_config(), client, store);

    let sink: Box<dyn AlertSink> = if config.bell {
        Box::new(TerminalBell)
    } else {
        Box::new(SilentSink::new())
    };
    let mut handle = monitor.start(ImageDirSource::new(&config.frames_dir), sink)?;
    handle.pull_remote_settings().await?;

    let mut events = handle.subscribe_events();
    let mut summary = tokio::time::interval(Duration::from_secs(config.summary_interval_secs.max(1)));
    summary.tick().await;

    let mut guide = BreathingGuide::default();
    let mut breath = tokio::time::interval(Duration::from_secs(1));
    breath.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(MonitorEvent::ZenModeSuggested { episodes }) => {
                    if let Some(line) = guide.start() {
                        info!("{} drowsy episodes, time for a break. {}", episodes, line);
                        breath.reset();
                    }
                }
                Ok(event) => report_event(&event),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} monitor events", missed),
                Err(RecvError::Closed) => {
                    warn!("Monitoring loop ended unexpectedly");
                    break;
                }
            },
            _ = summary.tick() => report_summary(&handle),
            _ = breath.tick(), if guide.is_active() => {
                if let Some(line) = guide.tick() {
                    info!("{}", line);
                }
            }
        }
    }

    if let Some(dir) = &config.export_dir {
        handle.export(dir)?;
    }
    let stats = handle.shutdown().await?;
    info!(
        "Session finished: {} requests, {} applied, {} failures, {} skipped ticks",
        stats.requests_issued, stats.responses_applied, stats.failures, stats.skipped_ticks
    );
    Ok(())
}

fn report_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::SustainedDrowsiness { quote, .. } => {
            warn!("Stay alert! \"{}\" ({})", quote.text, quote.author);
        }
        event if event.is_alert() => warn!("{}", event.message()),
        event => info!("{}", event.message()),
    }
}

/// Walks through one breathing exercise per zen suggestion, one step a second.
///
/// Each suggestion moves on to the next exercise in the rotation.
#[derive(Debug, Default)]
struct BreathingGuide {
    cycle: BreathingCycle,
    active: bool,
    guided: u32,
}

impl BreathingGuide {
    /// Begin an exercise; `None` while one is already running
    fn start(&mut self) -> Option<String> {
        if self.active {
            return None;
        }
        if self.guided > 0 {
            self.cycle.next_exercise();
        }
        self.guided += 1;
        self.active = true;

        let exercise = self.cycle.exercise();
        Some(format!(
            "{}: inhale {}s, hold {}s, exhale {}s. Inhale for {}s",
            exercise.name,
            exercise.inhale,
            exercise.hold,
            exercise.exhale,
            self.cycle.remaining_secs()
        ))
    }

    fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one second; a line when the phase changes
    fn tick(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        let phase = self.cycle.tick()?;
        let step = match phase {
            BreathingPhase::Inhale => {
                self.active = false;
                return Some(format!("{} complete", self.cycle.exercise().name));
            }
            BreathingPhase::Hold => "Hold",
            BreathingPhase::Exhale => "Exhale",
        };
        Some(format!("{} for {}s", step, self.cycle.remaining_secs()))
    }
}

fn report_summary<A: DetectionApi>(handle: &MonitorHandle<A>) {
    let snapshot = handle.snapshot();
    let elapsed_ms = Utc::now().timestamp_millis() - handle.session().start_time;
    let elapsed = Duration::from_millis(elapsed_ms.max(0) as u64);
    info!("{}", summary_line(&snapshot, elapsed));
}

/// One-line status: state, quality, EAR and server statistics
pub fn summary_line(snapshot: &MonitorSnapshot, elapsed: Duration) -> String {
    let state = &snapshot.state;
    let summary = StatsSummary::new(&state.stats, elapsed);
    let ear = state
        .ear_history
        .back()
        .map(|ear| format!("{:.3}", ear))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "[{}] {:?} | {} | EAR {} | events {} | blinks {} | drowsy {} | avg EAR {}",
        summary.session_duration,
        state.monitor_state,
        state.detection_quality.label(),
        ear,
        summary.drowsiness_events,
        summary.blink_rate,
        summary.drowsiness_percentage,
        summary.average_ear,
    )
}
