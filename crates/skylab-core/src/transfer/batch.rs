//! Batch download of many photos sharing one profile.
//!
//! The profile and its backgrounds are resolved once, then every photo is
//! downloaded in its own tokio task, bounded by a semaphore. Every input id
//! produces exactly one outcome.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::composite::{load_backgrounds, BackgroundSet};
use super::download::{DownloadOptions, Downloader, OutputPlan};
use crate::api::StudioApi;
use crate::error::{Result, TransferError};
use crate::types::{BatchResult, PhotoRef, ProfileSettings, TransferOutcome};

/// Concurrent downloader for a set of photos.
pub struct BatchDownloader {
    api: StudioApi,
    downloader: Arc<Downloader>,
    max_concurrency: usize,
}

impl BatchDownloader {
    pub fn new(api: StudioApi, downloader: Arc<Downloader>, max_concurrency: usize) -> Self {
        Self {
            api,
            downloader,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Download every photo into `output_dir`.
    ///
    /// Fails up front (with no network traffic) only when `output_dir` is
    /// not an existing directory. Afterwards, each photo lands in exactly one
    /// of the two result lists; a failed profile lookup marks all of them
    /// errored.
    pub async fn download_all(
        &self,
        photos: &[PhotoRef],
        profile_id: u64,
        output_dir: &Path,
    ) -> Result<BatchResult> {
        if !output_dir.is_dir() {
            return Err(TransferError::InvalidOutputPath(output_dir.to_path_buf()).into());
        }

        let photos = dedup_photos(photos);
        if photos.is_empty() {
            return Ok(BatchResult::default());
        }

        let (profile, backgrounds) = match self.prepare(profile_id).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!(
                    "Cannot prepare profile {profile_id}, failing {} photo(s): {e}",
                    photos.len()
                );
                return Ok(photos
                    .iter()
                    .map(|photo| TransferOutcome::failure(label(photo)))
                    .collect());
            }
        };

        tracing::info!(
            "Downloading {} photo(s) to {:?} ({} at a time)",
            photos.len(),
            output_dir,
            self.max_concurrency
        );

        let options = DownloadOptions {
            profile: Some(profile),
            backgrounds: Some(backgrounds),
            return_on_error: true,
        };
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(photos.len());

        for photo in &photos {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Download semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let downloader = self.downloader.clone();
            let options = options.clone();
            let output_dir = output_dir.to_path_buf();
            let photo_id = photo.id;

            handles.push(tokio::spawn(async move {
                let outcome = downloader.download(photo_id, &output_dir, &options).await;
                drop(permit);
                outcome
            }));
        }

        let mut handles = handles.into_iter();
        let mut result = BatchResult::default();
        for photo in &photos {
            let outcome = match handles.next() {
                Some(handle) => match handle.await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => {
                        tracing::warn!("Download of photo {} failed: {e}", photo.id);
                        TransferOutcome::failure(label(photo))
                    }
                    Err(e) => {
                        tracing::error!("Download task for photo {} panicked: {e}", photo.id);
                        TransferOutcome::failure(label(photo))
                    }
                },
                None => TransferOutcome::failure(label(photo)),
            };
            result.push(outcome);
        }

        tracing::info!(
            "Batch complete: {} succeeded, {} failed",
            result.success_photos.len(),
            result.errored_photos.len()
        );
        Ok(result)
    }

    /// Fetch the profile and, when it composites, decode its backgrounds once.
    async fn prepare(&self, profile_id: u64) -> Result<(Arc<ProfileSettings>, BackgroundSet)> {
        let profile = self.api.get_profile(profile_id).await?;
        let composites = OutputPlan::for_profile(&profile).composite;
        let backgrounds = if composites && profile.has_backgrounds() {
            load_backgrounds(&self.api, &profile).await?
        } else {
            if composites {
                tracing::warn!("Profile {profile_id} replaces backgrounds but declares none");
            }
            Arc::new(Vec::new())
        };
        Ok((Arc::new(profile), backgrounds))
    }
}

/// Drop repeated ids, keeping the first occurrence.
fn dedup_photos(photos: &[PhotoRef]) -> Vec<PhotoRef> {
    let mut seen = HashSet::new();
    photos
        .iter()
        .filter(|photo| seen.insert(photo.id))
        .cloned()
        .collect()
}

/// Name to report for a photo that never produced an outcome of its own.
fn label(photo: &PhotoRef) -> String {
    match &photo.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => photo.id.to_string(),
    }
}
