//! Monitoring session lifecycle

use alerting::{AlertSink, SoundAlertManager};
use camera_capture::FrameSource;
use detection_client::DetectionApi;
use dms::{DrowsinessStateMachine, MonitorEvent};
use session_store::{export_json, Session, SessionStore, SettingsPatch};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::camera::SharedCamera;
use crate::config::{dms_config, sound_config, MonitorConfig};
use crate::poller::{Command, PollLoop, PollerStats};
use crate::snapshot::{MonitorSnapshot, SessionExport};
use crate::MonitorError;

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

/// Starts monitoring sessions against one detection service and store
pub struct Monitor<A: DetectionApi> {
    config: MonitorConfig,
    api: Arc<A>,
    store: Arc<Mutex<SessionStore>>,
}

impl<A: DetectionApi> Monitor<A> {
    pub fn new(config: MonitorConfig, api: A, store: SessionStore) -> Self {
        Self {
            config,
            api: Arc::new(api),
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Acquire the camera and start polling.
    ///
    /// Must be called from within a Tokio runtime. On acquisition failure
    /// nothing is spawned and `start` may be called again with a fresh source.
    pub fn start<F, S>(&self, mut source: F, sink: S) -> Result<MonitorHandle<A>, MonitorError>
    where
        F: FrameSource,
        S: AlertSink + 'static,
    {
        let session = lock(&self.store)?.load();
        let sound = SoundAlertManager::new(sink, sound_config(&session.settings));
        let machine = DrowsinessStateMachine::new(dms_config(&self.config, &session.settings), sound)?;

        if let Err(e) = source.acquire() {
            warn!("Camera acquisition failed: {}", e);
            return Err(MonitorError::Acquisition(e));
        }

        let camera = SharedCamera::new(source);
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (snapshot_tx, snapshot_rx) = watch::channel(MonitorSnapshot::new(&session, machine.state()));
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let poll_loop = PollLoop {
            api: Arc::clone(&self.api),
            session_id: session.id.clone(),
            camera: camera.clone(),
            ticker,
            encoding: self.config.capture.clone(),
            machine,
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
            in_flight: JoinSet::new(),
            issued: 0,
            stats: PollerStats::default(),
        };
        let task = tokio::spawn(poll_loop.run());

        info!(
            "Monitoring session {} started, polling every {} ms",
            session.id, self.config.poll_interval_ms
        );

        Ok(MonitorHandle {
            config: self.config.clone(),
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            session,
            camera,
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            task: Some(task),
        })
    }
}

/// A running monitoring session.
///
/// Dropping the handle stops polling and releases the camera before the
/// drop returns.
pub struct MonitorHandle<A: DetectionApi> {
    config: MonitorConfig,
    api: Arc<A>,
    store: Arc<Mutex<SessionStore>>,
    session: Session,
    camera: SharedCamera,
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<MonitorSnapshot>,
    events: broadcast::Sender<MonitorEvent>,
    task: Option<JoinHandle<PollerStats>>,
}

impl<A: DetectionApi> MonitorHandle<A> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Latest published state
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.camera.is_held() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Merge a settings change.
    ///
    /// The change is stored and applied locally first; a failed push to
    /// the detection service is logged and does not roll it back.
    pub async fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Session, MonitorError> {
        self.session = lock(&self.store)?.update_settings(patch);
        self.apply_session_settings().await?;

        if let Err(e) = self.api.push_settings(&self.session.id, &self.session.settings).await {
            warn!("Failed to sync settings with detection service: {}", e);
        }
        Ok(self.session.clone())
    }

    /// Pull the service's copy of the settings and merge it locally
    pub async fn pull_remote_settings(&mut self) -> Result<Session, MonitorError> {
        match self.api.fetch_settings(&self.session.id).await {
            Ok(patch) if !patch.is_empty() => {
                self.session = lock(&self.store)?.update_settings(&patch);
                self.apply_session_settings().await?;
                info!("Merged settings from detection service");
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to fetch settings from detection service: {}", e),
        }
        Ok(self.session.clone())
    }

    /// Clear all session state, locally and on the detection service.
    ///
    /// The session id survives; settings return to their defaults.
    pub async fn reset(&mut self) -> Result<Session, MonitorError> {
        self.session = lock(&self.store)?.reset();

        let (done, ack) = oneshot::channel();
        self.send(Command::Reset { done }).await?;
        ack.await.map_err(|_| MonitorError::Stopped)?;
        self.apply_session_settings().await?;

        if let Err(e) = self.api.reset(&self.session.id).await {
            warn!("Failed to reset detection service session: {}", e);
        }
        Ok(self.session.clone())
    }

    /// Write the session and its histories as JSON into `dir`
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, MonitorError> {
        let export = SessionExport::new(&self.session, &self.snapshots.borrow());
        let path = export_json(dir, &export)?;
        info!("Session exported to {}", path.display());
        Ok(path)
    }

    /// Stop polling and release the camera before returning.
    ///
    /// Nothing is awaited; a capture still running on the blocking pool
    /// finishes first.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.camera.release();
            info!("Monitoring session {} stopped", self.session.id);
        }
    }

    /// Stop polling and wait until the camera has been released
    pub async fn shutdown(mut self) -> Result<PollerStats, MonitorError> {
        let task = self.task.take().ok_or(MonitorError::Stopped)?;
        // A closed channel means the loop is already on its way out
        let _ = self.commands.send(Command::Shutdown).await;

        let joined = task.await;
        self.camera.release();
        let stats = joined.map_err(|e| MonitorError::Task(e.to_string()))?;
        info!("Monitoring session {} shut down", self.session.id);
        Ok(stats)
    }

    async fn apply_session_settings(&self) -> Result<(), MonitorError> {
        let (done, ack) = oneshot::channel();
        self.send(Command::ApplySettings {
            dms: dms_config(&self.config, &self.session.settings),
            sound: sound_config(&self.session.settings),
            settings: self.session.settings.clone(),
            done,
        })
        .await?;
        ack.await.map_err(|_| MonitorError::Stopped)
    }

    async fn send(&self, command: Command) -> Result<(), MonitorError> {
        if self.task.is_none() {
            return Err(MonitorError::Stopped);
        }
        self.commands.send(command).await.map_err(|_| MonitorError::Stopped)
    }
}

impl<A: DetectionApi> Drop for MonitorHandle<A> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.camera.release();
    }
}

fn lock(store: &Mutex<SessionStore>) -> Result<std::sync::MutexGuard<'_, SessionStore>, MonitorError> {
    store
        .lock()
        .map_err(|e| MonitorError::StoreLock(e.to_string()))
}
