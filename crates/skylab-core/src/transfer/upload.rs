//! Single-photo upload: create the remote record, then PUT the bytes to a
//! presigned URL with a Content-MD5 integrity header.
//!
//! A record that was created but never received its bytes is deleted again
//! before the error is returned.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use super::retry::{is_retryable, Delay, RetryPolicy, TokioDelay};
use crate::api::StudioApi;
use crate::config::TransferConfig;
use crate::error::{Result, TransferError};
use crate::transport::Header;
use crate::types::{OwnerRef, PhotoRecord, UploadResult};

/// Extensions the service accepts for upload.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const TAGGING_HEADER: &str = "X-Amz-Tagging";
const TAGGING_VALUE: &str = "job=photo&api=true";

/// Uploads local images into a job or profile.
pub struct Uploader {
    api: StudioApi,
    max_upload_size_mb: u64,
    retry: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl Uploader {
    pub fn new(api: StudioApi, config: &TransferConfig) -> Self {
        Self {
            api,
            max_upload_size_mb: config.max_upload_size_mb,
            retry: RetryPolicy::from_config(config),
            delay: Arc::new(TokioDelay),
        }
    }

    /// Replace how the uploader waits between attempts.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upload `path` as a new photo owned by `owner`.
    pub async fn upload(&self, path: &Path, owner: OwnerRef) -> Result<UploadResult> {
        validate_upload_source(path, self.max_upload_size_mb).await?;

        let bytes = tokio::fs::read(path).await?;
        let content_md5 = content_md5(&bytes);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut headers: Vec<Header> = vec![("Content-MD5".to_string(), content_md5.clone())];
        if let OwnerRef::Job(job_id) = owner {
            let job = self.api.get_job(job_id).await?;
            if job.is_regular() {
                headers.push((TAGGING_HEADER.to_string(), TAGGING_VALUE.to_string()));
            }
        }

        let photo = self.create_record(path, &file_name, owner).await?;
        tracing::debug!("Created photo {} ({file_name}) for {owner:?}", photo.id);

        match self.send_bytes(photo.id, bytes, &content_md5, &headers).await {
            Ok(status) => {
                tracing::info!("Uploaded {file_name} as photo {}", photo.id);
                Ok(UploadResult {
                    photo,
                    upload_status_code: Some(status),
                })
            }
            Err(e) => {
                tracing::warn!("Upload of {file_name} failed, removing photo {}: {e}", photo.id);
                if let Err(delete_err) = self.api.delete_photo(photo.id).await {
                    tracing::warn!("Unable to remove photo {}: {delete_err}", photo.id);
                }
                Err(e)
            }
        }
    }

    async fn create_record(&self, path: &Path, file_name: &str, owner: OwnerRef) -> Result<PhotoRecord> {
        let mut payload = Map::new();
        payload.insert(owner.id_field().to_string(), Value::from(owner.id()));
        payload.insert("name".to_string(), Value::from(file_name));
        payload.insert("path".to_string(), Value::from(path.to_string_lossy().as_ref()));
        payload.insert("use_cache_upload".to_string(), Value::Bool(false));

        let failed = |message: String| TransferError::PhotoCreationFailed { message };

        let response = self
            .api
            .create_photo(&Value::Object(payload))
            .await
            .map_err(|e| failed(e.to_string()))?;
        if response.get("id").and_then(Value::as_u64).is_none() {
            return Err(failed(format!("no photo id in response: {response}")).into());
        }
        serde_json::from_value(response).map_err(|e| failed(e.to_string()).into())
    }

    /// Request the presigned URL and PUT the bytes, retrying per policy.
    /// Returns the bucket's status code.
    async fn send_bytes(
        &self,
        photo_id: u64,
        bytes: Vec<u8>,
        content_md5: &str,
        headers: &[Header],
    ) -> Result<u16> {
        let url = self.api.get_upload_url(photo_id, content_md5).await?;
        let transport = self.api.transport();
        let max_attempts = self.retry.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match transport.put_bytes(&url, bytes.clone(), headers).await {
                Ok(status) => return Ok(status),
                Err(e) if attempt < max_attempts && is_retryable(&e) => {
                    let delay = self.retry.delay_for(attempt - 1);
                    tracing::debug!(
                        "Retry {attempt}/{} for photo {photo_id} after {delay:?}: {e}",
                        max_attempts - 1
                    );
                    self.delay.wait(delay).await;
                }
                Err(e) => {
                    return Err(TransferError::UploadFailed {
                        photo_id,
                        attempts: attempt,
                        message: e.to_string(),
                    }
                    .into());
                }
            }
        }
    }
}

/// Check extension and size before any network traffic.
pub async fn validate_upload_source(path: &Path, max_upload_size_mb: u64) -> Result<()> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !supported {
        return Err(TransferError::InvalidFileType {
            path: path.to_path_buf(),
        }
        .into());
    }

    let size_bytes = tokio::fs::metadata(path).await?.len();
    if size_bytes > max_upload_size_mb.saturating_mul(1024 * 1024) {
        return Err(TransferError::InvalidFileSize {
            path: path.to_path_buf(),
            size_bytes,
            max_mb: max_upload_size_mb,
        }
        .into());
    }
    Ok(())
}

/// Base64 of the raw 16-byte MD5 digest, as the bucket expects.
pub fn content_md5(bytes: &[u8]) -> String {
    STANDARD.encode(Md5::digest(bytes))
}
