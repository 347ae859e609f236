//! Session store implementation

use crate::backend::{FileStore, KeyValueStore, MemoryStore};
use crate::session::{Session, Settings, SettingsPatch};
use crate::StoreError;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key holding the full session object
pub const SESSION_KEY: &str = "drowsiness_detection_session";

/// Key holding the settings alone, kept in sync with the session copy
pub const SETTINGS_KEY: &str = "drowsiness_detection_settings";

/// Session store with graceful in-memory fallback
///
/// Every operation succeeds from the caller's point of view: storage read,
/// write or parse failures are logged and the last known (or a default)
/// session is used instead.
pub struct SessionStore {
    backend: Box<dyn KeyValueStore>,
    /// Last session seen or written; serves reads while the backend is failing
    last_known: Option<Session>,
}

impl SessionStore {
    /// Create a store over any backend
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            last_known: None,
        }
    }

    /// Create a volatile store
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Open a file-backed store, falling back to memory if the directory is unusable
    pub fn open(dir: impl AsRef<Path>) -> Self {
        match FileStore::new(dir.as_ref()) {
            Ok(store) => Self::new(store),
            Err(e) => {
                warn!(
                    "Session storage at {} unavailable ({}), using in-memory session",
                    dir.as_ref().display(),
                    e
                );
                Self::in_memory()
            }
        }
    }

    /// Load the persisted session, creating one with defaults if absent
    pub fn load(&mut self) -> Session {
        match self.read_session() {
            Ok(Some(session)) => {
                self.last_known = Some(session.clone());
                session
            }
            Ok(None) => self.last_known_or_new(),
            Err(StoreError::Serialization(e)) => {
                warn!("Stored session is unreadable ({}), discarding it", e);
                for key in [SESSION_KEY, SETTINGS_KEY] {
                    if let Err(e) = self.backend.remove(key) {
                        warn!("Failed to remove {} ({})", key, e);
                    }
                }
                self.last_known_or_new()
            }
            Err(e) => {
                warn!("Failed to read session ({}), using in-memory session", e);
                self.last_known.get_or_insert_with(Session::new).clone()
            }
        }
    }

    /// Persist a session and its settings copy
    pub fn save(&mut self, session: &Session) {
        self.last_known = Some(session.clone());
        if let Err(e) = self.write_session(session) {
            warn!("Failed to persist session {} ({}), keeping it in memory", session.id, e);
        }
    }

    /// Merge a partial settings update into the session and persist it
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Session {
        let mut session = self.load();
        patch.apply_to(&mut session.settings);
        self.save(&session);
        debug!("Updated settings for session {}", session.id);
        session
    }

    /// Restart the session clock and restore default settings, keeping the id
    pub fn reset(&mut self) -> Session {
        let mut session = self.load();
        session.start_time = Utc::now().timestamp_millis();
        session.settings = Settings::default();
        self.save(&session);
        info!("Reset session {}", session.id);
        session
    }

    /// Current settings, read from the dedicated settings entry
    pub fn settings(&mut self) -> Settings {
        let stored = self
            .backend
            .get(SETTINGS_KEY)
            .and_then(|raw| match raw {
                Some(raw) => Ok(Some(serde_json::from_str::<Settings>(&raw)?)),
                None => Ok(None),
            });

        match stored {
            Ok(Some(settings)) => settings,
            Ok(None) => self.load().settings,
            Err(e) => {
                warn!("Failed to read settings ({}), using session copy", e);
                self.load().settings
            }
        }
    }

    fn last_known_or_new(&mut self) -> Session {
        match &self.last_known {
            Some(session) => session.clone(),
            None => {
                let session = Session::new();
                info!("Created new session {}", session.id);
                self.save(&session);
                session
            }
        }
    }

    fn read_session(&self) -> Result<Option<Session>, StoreError> {
        match self.backend.get(SESSION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_session(&self, session: &Session) -> Result<(), StoreError> {
        self.backend.set(SESSION_KEY, &serde_json::to_string(session)?)?;
        self.backend.set(SETTINGS_KEY, &serde_json::to_string(&session.settings)?)?;
        Ok(())
    }
}

/// Write `value` as a pretty JSON document named `drowsiness-session-<ms>.json` in `dir`
pub fn export_json<T: Serialize>(dir: impl AsRef<Path>, value: &T) -> Result<PathBuf, StoreError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = dir.join(format!(
        "drowsiness-session-{}.json",
        Utc::now().timestamp_millis()
    ));
    fs::write(&path, serde_json::to_string_pretty(value)?)?;

    info!("Exported session data to {}", path.display());
    Ok(path)
}
