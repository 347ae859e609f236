//! Layered application configuration

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use camera_capture::CaptureConfig;
use detection_client::ClientConfig;
use monitor::MonitorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "drowsy-monitor";

/// Prefix of the overriding environment variables, e.g. `DROWSY_POLL_INTERVAL_MS`
pub const ENV_PREFIX: &str = "DROWSY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub ear_window_capacity: usize,
    pub zen_episode_interval: u32,
    /// Where the session is persisted; in memory when unset
    pub storage_dir: Option<PathBuf>,
    /// Images replayed as camera frames
    pub frames_dir: PathBuf,
    /// Session export written on exit when set
    pub export_dir: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub max_width: u32,
    pub log_level: String,
    pub log_json: bool,
    /// Ring the terminal bell on alerts
    pub bell: bool,
    /// Seconds between statistics summaries
    pub summary_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        let monitor = MonitorConfig::default();
        Self {
            api_base_url: client.base_url,
            request_timeout_ms: client.timeout_ms,
            poll_interval_ms: monitor.poll_interval_ms,
            ear_window_capacity: monitor.ear_window_capacity,
            zen_episode_interval: monitor.zen_episode_interval,
            storage_dir: Some(PathBuf::from(".drowsy-monitor")),
            frames_dir: PathBuf::from("frames"),
            export_dir: None,
            jpeg_quality: monitor.capture.jpeg_quality,
            max_width: monitor.capture.max_width,
            log_level: "info".to_string(),
            log_json: false,
            bell: true,
            summary_interval_secs: 10,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `DROWSY_*` variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::new(CONFIG_FILE, FileFormat::Toml).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval_ms: self.poll_interval_ms,
            ear_window_capacity: self.ear_window_capacity,
            zen_episode_interval: self.zen_episode_interval,
            capture: CaptureConfig {
                jpeg_quality: self.jpeg_quality,
                max_width: self.max_width,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:5001/api");
        assert_eq!(config.request_timeout_ms, 2000);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.ear_window_capacity, 50);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(
            &path,
            "api_base_url = \"http://detector:5001/api\"\npoll_interval_ms = 200\nbell = false\nexport_dir = \"exports\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.api_base_url, "http://detector:5001/api");
        assert_eq!(config.poll_interval_ms, 200);
        assert!(!config.bell);
        assert_eq!(config.export_dir, Some(PathBuf::from("exports")));
        // Untouched keys keep their defaults
        assert_eq!(config.ear_window_capacity, 50);

        let monitor = config.monitor_config();
        assert_eq!(monitor.poll_interval_ms, 200);
        assert_eq!(config.client_config().base_url, "http://detector:5001/api");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(&path, "jpeg_quality = 60\n").unwrap();

        std::env::set_var("DROWSY_JPEG_QUALITY", "95");
        let config = AppConfig::load(Some(path.as_path()));
        std::env::remove_var("DROWSY_JPEG_QUALITY");

        assert_eq!(config.unwrap().jpeg_quality, 95);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }
}
