//! Skylab Core - client library for the Skylab Studio photo service.
//!
//! Uploads local images into a job or profile, and downloads processed
//! photos, materializing them according to the owning profile's output
//! policy (plain file, transparent extract, or composites over the
//! profile's background images).
//!
//! # Architecture
//!
//! ```text
//! upload:   File → validate → create record → presigned PUT (retry) ─┬→ UploadResult
//!                                                                    └→ rollback on failure
//! download: Photo → profile → retouched asset → decode → plain | extract | composites
//! batch:    profile + backgrounds once → N downloads (bounded) → BatchResult
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use skylab_core::{Config, StudioClient};
//!
//! #[tokio::main]
//! async fn main() -> skylab_core::Result<()> {
//!     let client = StudioClient::new(Config::load()?)?;
//!
//!     let uploaded = client.upload_job_photo("./shot.jpg", 42).await?;
//!     println!("Created photo {}", uploaded.photo.id);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod api;
pub mod config;
pub mod error;
pub mod transfer;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use api::StudioApi;
pub use config::Config;
pub use error::{ConfigError, Result, StudioError, TransferError, TransportError};
pub use transfer::{BatchDownloader, DownloadOptions, Downloader, RetryPolicy, Uploader};
pub use transport::{HttpTransport, Transport};
pub use types::{
    BatchResult, JobRecord, OwnerRef, PhotoRecord, PhotoRef, ProfileSettings, TransferOutcome,
    UploadResult,
};

use std::path::Path;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Studio client - the main entry point for photo transfers.
pub struct StudioClient {
    config: Config,
    api: StudioApi,
    uploader: Uploader,
    downloader: Arc<Downloader>,
    batch: BatchDownloader,
}

impl StudioClient {
    /// Create a client talking to the configured service over HTTP.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        tracing::debug!("Initializing Skylab client v{}", VERSION);
        let api = StudioApi::new(transport);
        let uploader = Uploader::new(api.clone(), &config.transfer);
        let downloader = Arc::new(Downloader::new(api.clone()));
        let batch = BatchDownloader::new(
            api.clone(),
            downloader.clone(),
            config.transfer.max_download_concurrency,
        );

        Self {
            config,
            api,
            uploader,
            downloader,
            batch,
        }
    }

    /// Create a client from the default config file.
    pub fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Self::new(config)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Typed access to the endpoints the client uses.
    pub fn api(&self) -> &StudioApi {
        &self.api
    }

    pub async fn get_photo(&self, photo_id: u64) -> Result<PhotoRecord> {
        self.api.get_photo(photo_id).await
    }

    pub async fn get_job(&self, job_id: u64) -> Result<JobRecord> {
        self.api.get_job(job_id).await
    }

    pub async fn get_profile(&self, profile_id: u64) -> Result<ProfileSettings> {
        self.api.get_profile(profile_id).await
    }

    pub async fn list_job_photos(&self, job_id: u64) -> Result<Vec<PhotoRecord>> {
        self.api.list_job_photos(job_id).await
    }

    pub async fn delete_photo(&self, photo_id: u64) -> Result<()> {
        self.api.delete_photo(photo_id).await
    }

    pub async fn upload_photo(&self, path: impl AsRef<Path>, owner: OwnerRef) -> Result<UploadResult> {
        self.uploader.upload(path.as_ref(), owner).await
    }

    pub async fn upload_job_photo(&self, path: impl AsRef<Path>, job_id: u64) -> Result<UploadResult> {
        self.upload_photo(path, OwnerRef::Job(job_id)).await
    }

    /// Upload a background image into a profile.
    pub async fn upload_profile_photo(
        &self,
        path: impl AsRef<Path>,
        profile_id: u64,
    ) -> Result<UploadResult> {
        self.upload_photo(path, OwnerRef::Profile(profile_id)).await
    }

    /// Download one processed photo into a directory or to a file path.
    pub async fn download_photo(
        &self,
        photo_id: u64,
        output_path: impl AsRef<Path>,
        options: &DownloadOptions,
    ) -> Result<TransferOutcome> {
        self.downloader
            .download(photo_id, output_path.as_ref(), options)
            .await
    }

    /// Download many photos of one profile into an existing directory.
    pub async fn download_all_photos(
        &self,
        photos: &[PhotoRef],
        profile_id: u64,
        output_dir: impl AsRef<Path>,
    ) -> Result<BatchResult> {
        self.batch
            .download_all(photos, profile_id, output_dir.as_ref())
            .await
    }
}
