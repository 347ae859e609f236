//! Detection Service Client
//!
//! Talks to the remote drowsiness detection service:
//! - `POST /detect` with a JPEG data URL per poll
//! - `POST /settings` / `GET /settings` to mirror session settings
//! - `POST /reset` to clear server-side statistics

mod client;
mod wire;

pub use client::{ClientConfig, DetectionClient, SESSION_HEADER};
pub use wire::RemoteSettings;

use dms::DetectionResult;
use session_store::{Settings, SettingsPatch};
use std::future::Future;
use thiserror::Error;

/// Detection client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

/// Operations the monitor needs from the detection service
pub trait DetectionApi: Send + Sync + 'static {
    /// Submit one frame for analysis
    fn detect(
        &self,
        session_id: &str,
        image: String,
    ) -> impl Future<Output = Result<DetectionResult, ClientError>> + Send;

    /// Mirror the session settings server-side
    fn push_settings(
        &self,
        session_id: &str,
        settings: &Settings,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Settings previously stored for the session
    fn fetch_settings(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SettingsPatch, ClientError>> + Send;

    /// Clear server-side statistics for the session
    fn reset(&self, session_id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
}
