//! Detection poll loop

use alerting::{AlertSink, SoundConfig};
use camera_capture::{CameraError, CaptureConfig};
use detection_client::{ClientError, DetectionApi};
use dms::{DetectionResult, DmsConfig, DrowsinessStateMachine, MonitorEvent};
use serde::Serialize;
use session_store::Settings;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Interval;
use tracing::{debug, info, warn};

use crate::camera::SharedCamera;
use crate::snapshot::MonitorSnapshot;

/// Counters kept by the poll loop
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollerStats {
    /// Polls started, each a frame capture followed by a detection request
    pub requests_issued: u64,
    /// Responses fed into the state machine
    pub responses_applied: u64,
    /// Failed captures and requests
    pub failures: u64,
    /// Ticks skipped because a request was still in flight
    pub skipped_ticks: u64,
    /// Responses dropped because a newer request superseded them
    pub stale_discarded: u64,
}

/// Requests from the session handle to the loop
pub(crate) enum Command {
    ApplySettings {
        dms: DmsConfig,
        sound: SoundConfig,
        settings: Settings,
        done: oneshot::Sender<()>,
    },
    Reset {
        done: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Why a poll produced no detection result
pub(crate) enum PollFailure {
    Capture(CameraError),
    Detect(ClientError),
}

type Completion = (u64, Result<DetectionResult, PollFailure>);

/// The loop owning one monitoring session's poll timer and state machine
pub(crate) struct PollLoop<A: DetectionApi, S: AlertSink> {
    pub(crate) api: Arc<A>,
    pub(crate) session_id: String,
    pub(crate) camera: SharedCamera,
    pub(crate) ticker: Interval,
    pub(crate) encoding: CaptureConfig,
    pub(crate) machine: DrowsinessStateMachine<S>,
    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) snapshots: watch::Sender<MonitorSnapshot>,
    pub(crate) events: broadcast::Sender<MonitorEvent>,
    pub(crate) in_flight: JoinSet<Completion>,
    /// Sequence number of the newest request
    pub(crate) issued: u64,
    pub(crate) stats: PollerStats,
}

impl<A, S> PollLoop<A, S>
where
    A: DetectionApi,
    S: AlertSink + 'static,
{
    /// Run until shut down; returns the final counters
    pub(crate) async fn run(mut self) -> PollerStats {
        info!("Detection polling started for session {}", self.session_id);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_completion(joined);
                }
                _ = self.ticker.tick() => self.on_tick(),
            }
        }

        self.in_flight.abort_all();
        self.camera.release();
        info!(
            "Detection polling stopped: {} requests, {} applied, {} failures",
            self.stats.requests_issued, self.stats.responses_applied, self.stats.failures
        );
        self.stats.clone()
    }

    fn on_tick(&mut self) {
        if !self.in_flight.is_empty() {
            self.stats.skipped_ticks += 1;
            debug!("Previous detection still in flight, skipping tick");
            return;
        }

        self.issued += 1;
        let seq = self.issued;
        let api = Arc::clone(&self.api);
        let session_id = self.session_id.clone();
        let camera = self.camera.clone();
        let encoding = self.encoding.clone();
        self.in_flight.spawn(async move {
            let result = match tokio::task::spawn_blocking(move || camera.grab(&encoding)).await {
                Ok(Ok(image)) => api.detect(&session_id, image).await.map_err(PollFailure::Detect),
                Ok(Err(e)) => Err(PollFailure::Capture(e)),
                Err(e) => Err(PollFailure::Capture(CameraError::Stream(e.to_string()))),
            };
            (seq, result)
        });
        self.stats.requests_issued += 1;
    }

    fn on_completion(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                warn!("Detection task failed: {}", e);
                self.stats.failures += 1;
                self.machine.mark_communication_failure();
            }
            Ok((seq, _)) if seq != self.issued => {
                debug!("Discarding stale response {} (latest {})", seq, self.issued);
                self.stats.stale_discarded += 1;
                return;
            }
            Ok((_, Ok(result))) => {
                self.stats.responses_applied += 1;
                for event in self.machine.apply(&result) {
                    // No subscribers is fine
                    let _ = self.events.send(event);
                }
            }
            Ok((_, Err(PollFailure::Capture(e)))) => {
                warn!("Frame capture failed: {}", e);
                self.stats.failures += 1;
                self.machine.mark_communication_failure();
            }
            Ok((_, Err(PollFailure::Detect(e)))) => {
                warn!("Detection request failed: {}", e);
                self.stats.failures += 1;
                self.machine.mark_communication_failure();
            }
        }
        self.publish();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ApplySettings {
                dms,
                sound,
                settings,
                done,
            } => {
                if let Err(e) = self.machine.set_config(dms) {
                    warn!("Rejected detection settings: {}", e);
                }
                let manager = self.machine.sound_mut();
                manager.set_volume(sound.volume);
                manager.set_cooldown(sound.cooldown_ms);
                self.snapshots.send_modify(|snap| snap.settings = settings);
                self.publish();
                let _ = done.send(());
            }
            Command::Reset { done } => {
                self.machine.reset();
                // Anything still in flight belongs to the old session state
                self.issued += 1;
                self.in_flight.abort_all();
                self.publish();
                info!("Session state reset");
                let _ = done.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn publish(&self) {
        let state = self.machine.state().clone();
        let poller = self.stats.clone();
        self.snapshots.send_modify(|snap| {
            snap.state = state;
            snap.poller = poller;
        });
    }
}
