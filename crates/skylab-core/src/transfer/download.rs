//! Single-photo download: resolve the processed asset, decide how to
//! materialize it from the profile flags, and write the result file(s).

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{self, png_file_name};
use super::composite::{
    composite_file_name, composite_onto_backgrounds, load_backgrounds, BackgroundSet,
};
use crate::api::StudioApi;
use crate::error::{Result, StudioError, TransferError};
use crate::types::{PhotoRecord, ProfileSettings, TransferOutcome};

/// Per-call download options.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Profile already fetched by the caller (skips one request per photo)
    pub profile: Option<Arc<ProfileSettings>>,
    /// Backgrounds already decoded by the caller
    pub backgrounds: Option<BackgroundSet>,
    /// Report failures as an unsuccessful outcome instead of an error
    pub return_on_error: bool,
}

/// Which files a photo produces, derived from its profile flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPlan {
    /// Write the decoded image under its own name
    pub plain: bool,
    /// Write a PNG extract
    pub extract: bool,
    /// Composite onto each background
    pub composite: bool,
}

impl OutputPlan {
    pub fn for_profile(profile: &ProfileSettings) -> Self {
        let is_extract = profile.enable_extract;
        let is_dual = profile.dual_file_output;
        let replace = profile.replace_background;

        if !is_extract {
            return Self {
                plain: true,
                extract: false,
                composite: false,
            };
        }

        Self {
            plain: false,
            // Dual output always keeps the extract; otherwise it is only
            // written when there is nothing to composite.
            extract: is_dual || !replace,
            composite: replace,
        }
    }
}

/// Split an output path into (directory, explicit file name).
///
/// An existing directory means "auto-name from the remote photo".
pub fn resolve_output_path(output_path: &Path) -> (PathBuf, Option<String>) {
    if output_path.is_dir() {
        return (output_path.to_path_buf(), None);
    }
    let file_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let dir = output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    (dir, file_name)
}

/// Last path component of a remote photo name, if it is a plain file name.
fn remote_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
}

/// Downloads one processed photo at a time.
pub struct Downloader {
    api: StudioApi,
}

impl Downloader {
    pub fn new(api: StudioApi) -> Self {
        Self { api }
    }

    /// Download one photo into `output_path` (a directory or a file path).
    ///
    /// With `return_on_error`, failures come back as an unsuccessful
    /// outcome named after the photo (or its id when the name never
    /// resolved).
    pub async fn download(
        &self,
        photo_id: u64,
        output_path: &Path,
        options: &DownloadOptions,
    ) -> Result<TransferOutcome> {
        let (dir, mut file_name) = resolve_output_path(output_path);

        match self.download_into(photo_id, &dir, &mut file_name, options).await {
            Ok(()) => {
                let name = file_name.unwrap_or_else(|| photo_id.to_string());
                tracing::info!("Successfully downloaded: {name}");
                Ok(TransferOutcome::success(name))
            }
            Err(e) => {
                let name = file_name.unwrap_or_else(|| photo_id.to_string());
                if options.return_on_error {
                    tracing::warn!("Failed to download photo id {photo_id} ({name}): {e}");
                    Ok(TransferOutcome::failure(name))
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn download_into(
        &self,
        photo_id: u64,
        dir: &Path,
        file_name: &mut Option<String>,
        options: &DownloadOptions,
    ) -> Result<()> {
        let photo = self.api.get_photo(photo_id).await?;
        let name = match file_name.clone() {
            Some(name) => name,
            None => {
                let name = remote_file_name(&photo.name).ok_or_else(|| {
                    TransferError::InvalidFileName {
                        photo_id,
                        name: photo.name.clone(),
                    }
                })?;
                *file_name = Some(name.clone());
                name
            }
        };

        let profile = match &options.profile {
            Some(profile) => profile.clone(),
            None => Arc::new(self.profile_for(&photo).await?),
        };
        let plan = OutputPlan::for_profile(&profile);
        tracing::debug!("Photo {photo_id} ({name}): {plan:?}");

        let bytes = self.api.fetch_asset(photo.retouched_url.as_deref()).await?;
        let image = codec::decode(bytes, &name).await?;

        let backgrounds = if plan.composite {
            match &options.backgrounds {
                Some(backgrounds) => backgrounds.clone(),
                None if profile.has_backgrounds() => load_backgrounds(&self.api, &profile).await?,
                None => {
                    tracing::warn!(
                        "Profile {} replaces backgrounds but declares none; no composites for {name}",
                        profile.id
                    );
                    Arc::new(Vec::new())
                }
            }
        } else {
            Arc::new(Vec::new())
        };

        let output_file_type = profile.output_file_type().to_string();
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
            materialize(plan, &image, &backgrounds, &name, &output_file_type, &dir)
        })
        .await
        .map_err(|e| TransferError::Encode {
            path: PathBuf::from(photo.name.as_str()),
            message: format!("Task join error: {e}"),
        })??;

        Ok(())
    }

    /// Resolve the owning profile through the photo's job.
    async fn profile_for(&self, photo: &PhotoRecord) -> Result<ProfileSettings> {
        let profile_id = match photo.profile_id() {
            Some(id) => id,
            None => {
                let job_id = photo.job_id.ok_or_else(|| TransferError::InvalidRemoteAsset {
                    url: format!("photo {} has no owning job", photo.id),
                })?;
                self.api.get_job(job_id).await?.profile_id.ok_or_else(|| {
                    TransferError::InvalidRemoteAsset {
                        url: format!("job {job_id} has no profile"),
                    }
                })?
            }
        };
        self.api.get_profile(profile_id).await
    }
}

/// Write the files an [`OutputPlan`] calls for.
fn materialize(
    plan: OutputPlan,
    image: &DynamicImage,
    backgrounds: &[DynamicImage],
    file_name: &str,
    output_file_type: &str,
    dir: &Path,
) -> std::result::Result<(), StudioError> {
    if plan.plain {
        codec::write_image(image, &dir.join(file_name))?;
    }
    if plan.extract {
        codec::write_image(image, &dir.join(png_file_name(file_name)))?;
    }
    if plan.composite {
        // The first composite would land on the extract's name
        let extract_taken = plan.extract
            && composite_file_name(file_name, output_file_type, 0) == png_file_name(file_name);
        composite_onto_backgrounds(
            image,
            backgrounds,
            file_name,
            output_file_type,
            dir,
            usize::from(extract_taken),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{extract_image, png_bytes, solid_background, FakeTransport};
    use serde_json::json;

    fn profile(extract: bool, dual: bool, replace: bool) -> ProfileSettings {
        serde_json::from_value(json!({
            "id": 3,
            "enableExtract": extract,
            "dualFileOutput": dual,
            "replaceBackground": replace,
            "outputFileType": "jpg",
            "photos": [
                { "id": 50, "jobId": null, "originalUrl": "https://cdn.test/bg1.png" },
                { "id": 51, "jobId": null, "originalUrl": "https://cdn.test/bg2.png" }
            ]
        }))
        .unwrap()
    }

    /// A fake service with photo 1 ("shot.jpg") in job 7 under profile 3.
    fn service(profile_json: &ProfileSettings) -> Arc<FakeTransport> {
        let fake = Arc::new(FakeTransport::new());
        fake.add_photo(json!({
            "id": 1,
            "name": "shot.jpg",
            "retouchedUrl": "https://cdn.test/1.png",
            "jobId": 7,
            "job": { "id": 7, "profileId": 3 }
        }));
        fake.add_profile(serde_json::to_value(profile_json).unwrap());
        fake.add_asset("https://cdn.test/1.png", png_bytes(&extract_image(12, 8)));
        fake.add_asset("https://cdn.test/bg1.png", png_bytes(&solid_background(30, 30, [0, 0, 255])));
        fake.add_asset("https://cdn.test/bg2.png", png_bytes(&solid_background(5, 40, [0, 255, 0])));
        fake
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_output_plan_table() {
        let plain = OutputPlan::for_profile(&profile(false, true, true));
        assert_eq!(
            plain,
            OutputPlan { plain: true, extract: false, composite: false }
        );
        assert_eq!(
            OutputPlan::for_profile(&profile(true, true, true)),
            OutputPlan { plain: false, extract: true, composite: true }
        );
        assert_eq!(
            OutputPlan::for_profile(&profile(true, true, false)),
            OutputPlan { plain: false, extract: true, composite: false }
        );
        assert_eq!(
            OutputPlan::for_profile(&profile(true, false, true)),
            OutputPlan { plain: false, extract: false, composite: true }
        );
        assert_eq!(
            OutputPlan::for_profile(&profile(true, false, false)),
            OutputPlan { plain: false, extract: true, composite: false }
        );
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_output_path(dir.path()), (dir.path().to_path_buf(), None));

        let target = dir.path().join("renamed.png");
        assert_eq!(
            resolve_output_path(&target),
            (dir.path().to_path_buf(), Some("renamed.png".to_string()))
        );

        assert_eq!(
            resolve_output_path(Path::new("bare.png")),
            (PathBuf::from("."), Some("bare.png".to_string()))
        );
    }

    #[tokio::test]
    async fn test_plain_download_never_composites() {
        let settings = profile(false, false, true);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        let outcome = Downloader::new(StudioApi::new(fake.clone()))
            .download(1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::success("shot.jpg"));
        assert_eq!(listing(dir.path()), vec!["shot.jpg"]);
        // No background was ever fetched
        assert_eq!(fake.asset_calls(), vec!["https://cdn.test/1.png".to_string()]);
    }

    #[tokio::test]
    async fn test_dual_output_with_replacement_writes_extract_and_composites() {
        let settings = profile(true, true, true);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        let outcome = Downloader::new(StudioApi::new(fake))
            .download(1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert!(outcome.succeeded);
        assert_eq!(listing(dir.path()), vec!["shot (2).jpg", "shot.jpg", "shot.png"]);
    }

    #[tokio::test]
    async fn test_dual_png_output_keeps_extract_apart_from_composites() {
        let mut settings = profile(true, true, true);
        settings.output_file_type = None;
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        Downloader::new(StudioApi::new(fake))
            .download(1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(
            listing(dir.path()),
            vec!["shot (2).png", "shot (3).png", "shot.png"]
        );
        // The extract keeps its transparency; composites are opaque
        let extract = image::open(dir.path().join("shot.png")).unwrap().to_rgba8();
        assert_eq!(extract.get_pixel(1, 4).0[3], 0);
        let composite = image::open(dir.path().join("shot (2).png")).unwrap().to_rgba8();
        assert_eq!(composite.get_pixel(1, 4).0, [0, 0, 255, 255]);
    }

    #[tokio::test]
    async fn test_replacement_without_dual_skips_bare_extract() {
        let settings = profile(true, false, true);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        Downloader::new(StudioApi::new(fake))
            .download(1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(listing(dir.path()), vec!["shot (2).jpg", "shot.jpg"]);
    }

    #[tokio::test]
    async fn test_extract_only_writes_png() {
        let settings = profile(true, false, false);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        Downloader::new(StudioApi::new(fake))
            .download(1, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(listing(dir.path()), vec!["shot.png"]);
    }

    #[tokio::test]
    async fn test_explicit_file_path_renames_output() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();

        let outcome = Downloader::new(StudioApi::new(fake))
            .download(1, &dir.path().join("custom.png"), &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.file_name, "custom.png");
        assert_eq!(listing(dir.path()), vec!["custom.png"]);
    }

    #[tokio::test]
    async fn test_supplied_profile_and_backgrounds_skip_fetches() {
        let settings = profile(true, false, true);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions {
            profile: Some(Arc::new(settings)),
            backgrounds: Some(Arc::new(vec![solid_background(4, 4, [9, 9, 9])])),
            return_on_error: false,
        };

        Downloader::new(StudioApi::new(fake.clone()))
            .download(1, dir.path(), &options)
            .await
            .unwrap();

        assert!(!fake.calls().iter().any(|c| c.endpoint.starts_with("profiles/")));
        assert_eq!(fake.asset_calls().len(), 1);
        assert_eq!(listing(dir.path()), vec!["shot.jpg"]);
    }

    #[tokio::test]
    async fn test_unfinished_photo_errors_or_reports() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        fake.add_photo(json!({
            "id": 2,
            "name": "pending.jpg",
            "retouchedUrl": null,
            "job": { "id": 7, "profileId": 3 }
        }));
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(StudioApi::new(fake));

        let err = downloader
            .download(2, dir.path(), &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::Transfer(TransferError::InvalidRemoteAsset { .. })
        ));

        let options = DownloadOptions {
            return_on_error: true,
            ..DownloadOptions::default()
        };
        let outcome = downloader.download(2, dir.path(), &options).await.unwrap();
        assert_eq!(outcome, TransferOutcome::failure("pending.jpg"));
    }

    #[tokio::test]
    async fn test_remote_name_cannot_leave_output_dir() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        fake.add_photo(json!({
            "id": 8,
            "name": "../escaped.jpg",
            "retouchedUrl": "https://cdn.test/1.png",
            "job": { "id": 7, "profileId": 3 }
        }));
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let outcome = Downloader::new(StudioApi::new(fake))
            .download(8, &out, &DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::success("escaped.jpg"));
        assert_eq!(listing(&out), vec!["escaped.jpg"]);
        assert!(!root.path().join("escaped.jpg").exists());
    }

    #[tokio::test]
    async fn test_unusable_remote_name_is_rejected() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        fake.add_photo(json!({
            "id": 9,
            "name": "..",
            "retouchedUrl": "https://cdn.test/1.png",
            "job": { "id": 7, "profileId": 3 }
        }));
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(StudioApi::new(fake.clone()));

        let err = downloader
            .download(9, dir.path(), &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::Transfer(TransferError::InvalidFileName { photo_id: 9, .. })
        ));

        let options = DownloadOptions {
            return_on_error: true,
            ..DownloadOptions::default()
        };
        let outcome = downloader.download(9, dir.path(), &options).await.unwrap();
        assert_eq!(outcome, TransferOutcome::failure("9"));
        assert!(fake.asset_calls().is_empty());
        assert!(listing(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_photo_reports_id() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions {
            return_on_error: true,
            ..DownloadOptions::default()
        };

        let outcome = Downloader::new(StudioApi::new(fake))
            .download(404, dir.path(), &options)
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::failure("404"));
    }

    #[tokio::test]
    async fn test_profile_resolved_through_job_when_not_embedded() {
        let settings = profile(false, false, false);
        let fake = service(&settings);
        fake.add_photo(json!({
            "id": 5,
            "name": "loose.jpg",
            "retouchedUrl": "https://cdn.test/1.png",
            "jobId": 7
        }));
        fake.add_job(json!({ "id": 7, "type": "regular", "profileId": 3 }));
        let dir = tempfile::tempdir().unwrap();

        let outcome = Downloader::new(StudioApi::new(fake.clone()))
            .download(5, dir.path(), &DownloadOptions::default())
            .await
            .unwrap();

        assert!(outcome.succeeded);
        assert!(fake.calls().iter().any(|c| c.endpoint == "jobs/7"));
    }
}
