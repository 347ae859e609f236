//! reqwest-based detection service client

use dms::DetectionResult;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use session_store::{Settings, SettingsPatch};
use std::time::Duration;
use tracing::{debug, info};

use crate::wire::{DetectRequest, RemoteSettings};
use crate::{ClientError, DetectionApi};

/// Header carrying the client session id
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `http://localhost:5001/api`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            timeout_ms: 2000,
        }
    }
}

/// Detection service client
#[derive(Debug, Clone)]
pub struct DetectionClient {
    http: Client,
    base_url: String,
}

impl DetectionClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!("Detection service at {}", base_url);
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn non-success statuses into errors
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Http(err.to_string())
}

impl DetectionApi for DetectionClient {
    async fn detect(&self, session_id: &str, image: String) -> Result<DetectionResult, ClientError> {
        let response = self
            .http
            .post(self.url("detect"))
            .header(SESSION_HEADER, session_id)
            .json(&DetectRequest { image: &image })
            .send()
            .await
            .map_err(transport)?;

        let result: DetectionResult = Self::decode(Self::check(response).await?).await?;
        if let Some(server_session) = result.session_id.as_deref() {
            if server_session != session_id {
                debug!("Service attributed frame to session {}", server_session);
            }
        }
        Ok(result)
    }

    async fn push_settings(&self, session_id: &str, settings: &Settings) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("settings"))
            .header(SESSION_HEADER, session_id)
            .json(&RemoteSettings::from(settings))
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        debug!("Pushed settings for session {}", session_id);
        Ok(())
    }

    async fn fetch_settings(&self, session_id: &str) -> Result<SettingsPatch, ClientError> {
        let response = self
            .http
            .get(self.url("settings"))
            .query(&[("sessionId", session_id)])
            .header(SESSION_HEADER, session_id)
            .send()
            .await
            .map_err(transport)?;

        let remote: RemoteSettings = Self::decode(Self::check(response).await?).await?;
        Ok(remote.into())
    }

    async fn reset(&self, session_id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("reset"))
            .header(SESSION_HEADER, session_id)
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        info!("Server-side statistics reset for session {}", session_id);
        Ok(())
    }
}
