use crate::error::{PrimaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default quiet period between a recipe edit and the preview request.
pub const DEFAULT_PREVIEW_DEBOUNCE_MS: u64 = 800;

/// Default hard timeout applied to every HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings for talking to the remote refinery service.
///
/// Passed explicitly to the API client, preview executor and export
/// compiler at construction. There is no ambient global: callers build
/// one (usually via [`load_app_config`]) and hand it down.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the service, including the `/api` prefix
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Debounce interval for speculative preview requests, in milliseconds
    pub preview_debounce_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            preview_debounce_ms: DEFAULT_PREVIEW_DEBOUNCE_MS,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    /// Join a path onto the base URL, normalising slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

/// Platform base directory for all prima state (config, session, logs).
///
/// - Windows: `%APPDATA%/prima`
/// - macOS: `~/Library/Application Support/prima`
/// - Linux: `~/.local/share/prima`
pub fn base_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| PrimaError::Config("Failed to determine data directory".to_owned()))?;
    Ok(data_dir.join("prima"))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("config.json"))
}

/// Load the app configuration, falling back to defaults if the file is
/// missing or unreadable.
pub fn load_app_config() -> AppConfig {
    if let Ok(path) = get_config_path()
        && path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(config) = serde_json::from_str::<AppConfig>(&content)
    {
        return config;
    }

    AppConfig::default()
}

pub fn save_app_config(config: &AppConfig) -> Result<()> {
    let path = get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.preview_debounce(), Duration::from_millis(800));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_endpoint_join() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("/preview"),
            "http://localhost:8000/api/preview"
        );
        assert_eq!(
            config.endpoint("upload/abc-123"),
            "http://localhost:8000/api/upload/abc-123"
        );
    }

    #[test]
    fn test_config_round_trip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: AppConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.api.base_url, config.api.base_url);
    }
}
