//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

/// Default service endpoint.
pub const DEFAULT_URL: &str = "https://studio.skylabtech.ai";

/// API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the studio service
    pub url: String,

    /// API key, or a `${ENV_VAR}` reference to one
    pub api_key: String,

    /// Public API version segment ("v1")
    pub api_version: String,

    /// Value of the X-SLT-API-CLIENT header
    pub client_stub: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: "${SKYLAB_API_KEY}".to_string(),
            api_version: "v1".to_string(),
            client_stub: format!("rust-{}", crate::VERSION),
            request_timeout_ms: 60_000,
        }
    }
}

impl ApiConfig {
    /// The API key with `${ENV_VAR}` references resolved.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_env_var(&self.api_key)
    }
}

/// Upload and download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Number of photos downloaded concurrently in a batch
    pub max_download_concurrency: usize,

    /// Largest file accepted for upload, in megabytes
    pub max_upload_size_mb: u64,

    /// Total attempts for the presigned upload PUT
    pub upload_retry_attempts: u32,

    /// Fixed delay between upload attempts in milliseconds
    pub upload_retry_delay_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_download_concurrency: 5,
            max_upload_size_mb: 27,
            upload_retry_attempts: 3,
            upload_retry_delay_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
