//! Typed accessors for the endpoints the transfer pipeline calls.

use crate::error::{Result, StudioError, TransferError, TransportError};
use crate::transport::{Method, Transport};
use crate::types::{JobRecord, PhotoRecord, ProfileSettings};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// Thin typed wrapper over a shared [`Transport`].
#[derive(Clone)]
pub struct StudioApi {
    transport: Arc<dyn Transport>,
}

impl StudioApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The underlying transport, for raw asset and upload calls.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn get_photo(&self, photo_id: u64) -> Result<PhotoRecord> {
        self.get_typed(&format!("photos/{photo_id}"), None).await
    }

    pub async fn get_job(&self, job_id: u64) -> Result<JobRecord> {
        self.get_typed(&format!("jobs/{job_id}"), None).await
    }

    pub async fn get_profile(&self, profile_id: u64) -> Result<ProfileSettings> {
        self.get_typed(&format!("profiles/{profile_id}"), None).await
    }

    /// All photos belonging to a job.
    pub async fn list_job_photos(&self, job_id: u64) -> Result<Vec<PhotoRecord>> {
        let payload = json!({ "job_id": job_id });
        self.get_typed("photos/list_for_job", Some(&payload)).await
    }

    /// Ask the service to create a photo record. Returns the raw response so
    /// the caller can decide what an empty answer means.
    pub async fn create_photo(&self, payload: &Value) -> std::result::Result<Value, TransportError> {
        self.transport
            .request(Method::POST, "photos", Some(payload))
            .await
    }

    /// Request a presigned upload URL for a photo.
    pub async fn get_upload_url(&self, photo_id: u64, content_md5: &str) -> Result<String> {
        let payload = json!({
            "use_cache_upload": false,
            "photo_id": photo_id,
            "content_md5": content_md5,
        });
        let resp = self
            .transport
            .request(Method::GET, "photos/upload_url", Some(&payload))
            .await?;

        match resp.get("url").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(TransportError::Unknown {
                status: None,
                message: format!("No upload url returned for photo {photo_id}"),
            }
            .into()),
        }
    }

    pub async fn delete_photo(&self, photo_id: u64) -> Result<()> {
        self.transport
            .request(Method::DELETE, &format!("photos/{photo_id}"), None)
            .await?;
        Ok(())
    }

    /// Download a processed or background asset.
    ///
    /// Rejects anything that is not an absolute http(s) URL: the service
    /// leaves `retouchedUrl` empty or relative until processing finishes.
    pub async fn fetch_asset(&self, url: Option<&str>) -> Result<Vec<u8>> {
        let url = url.unwrap_or_default();
        let parsed = reqwest::Url::parse(url);
        let absolute = matches!(&parsed, Ok(u) if matches!(u.scheme(), "http" | "https"));
        if !absolute {
            return Err(TransferError::InvalidRemoteAsset {
                url: url.to_string(),
            }
            .into());
        }
        Ok(self.transport.get_bytes(url).await?)
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<T> {
        let value = self
            .transport
            .request(Method::GET, endpoint, payload)
            .await?;
        serde_json::from_value(value).map_err(StudioError::from)
    }
}
