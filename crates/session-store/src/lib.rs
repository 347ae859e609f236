//! Session Store
//!
//! Owns the persisted session identity and user settings:
//! - Session id, start time and settings bundle
//! - Partial settings updates and explicit reset
//! - Key-value persistence backends (file directory, in-memory)
//! - Session data export to JSON

mod backend;
mod session;
mod store;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use session::{Session, Settings, SettingsPatch};
pub use store::{export_json, SessionStore, SESSION_KEY, SETTINGS_KEY};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
