//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.url).map_err(|e| {
            ConfigError::ValidationError(format!("api.url is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(
                "api.url must use http or https".into(),
            ));
        }
        if self.api.api_version.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.api_version must not be empty".into(),
            ));
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "api.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.transfer.max_download_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "transfer.max_download_concurrency must be > 0".into(),
            ));
        }
        if self.transfer.max_upload_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "transfer.max_upload_size_mb must be > 0".into(),
            ));
        }
        if self.transfer.upload_retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "transfer.upload_retry_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }
}
