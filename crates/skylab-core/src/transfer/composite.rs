//! Background replacement: composite an extracted foreground over each of a
//! profile's background images.

use futures_util::future::try_join_all;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{self, file_stem};
use crate::api::StudioApi;
use crate::error::{Result, TransferError};
use crate::types::ProfileSettings;

/// Decoded backgrounds, shared read-only across download tasks.
pub type BackgroundSet = Arc<Vec<DynamicImage>>;

/// Fetch and decode every standalone background of a profile, in profile
/// order. Downloads run concurrently; decoding runs on the blocking pool.
pub async fn load_backgrounds(api: &StudioApi, profile: &ProfileSettings) -> Result<BackgroundSet> {
    let loads = profile.background_photos().map(|photo| async move {
        let bytes = api.fetch_asset(photo.original_url.as_deref()).await?;
        let image = codec::decode(bytes, &format!("background {}", photo.id)).await?;
        Ok::<_, crate::error::StudioError>(image)
    });

    let backgrounds = try_join_all(loads).await?;
    tracing::debug!(
        "Decoded {} background(s) for profile {}",
        backgrounds.len(),
        profile.id
    );
    Ok(Arc::new(backgrounds))
}

/// Output name for the background at `index` (0-based).
///
/// The first background keeps the bare stem; later ones get ` (N)` with
/// `N = index + 1`, so the second file is `stem (2).ext`.
pub fn composite_file_name(base_file_name: &str, output_file_type: &str, index: usize) -> String {
    let stem = file_stem(base_file_name);
    let ext = output_file_type.trim_start_matches('.');
    if index == 0 {
        format!("{stem}.{ext}")
    } else {
        format!("{stem} ({}).{ext}", index + 1)
    }
}

/// Composite `foreground` over every background and write one file each.
///
/// Files are named from `first_index` on (see [`composite_file_name`]), so a
/// caller that already owns the bare name can start at 1. Any failure aborts
/// the remaining backgrounds for this photo. Returns the written paths in
/// background order.
pub fn composite_onto_backgrounds(
    foreground: &DynamicImage,
    backgrounds: &[DynamicImage],
    base_file_name: &str,
    output_file_type: &str,
    output_dir: &Path,
    first_index: usize,
) -> std::result::Result<Vec<PathBuf>, TransferError> {
    let failed = |message: String| TransferError::CompositingFailed {
        file_name: base_file_name.to_string(),
        message,
    };

    if !foreground.color().has_alpha() {
        return Err(failed("extracted image has no alpha channel".to_string()));
    }
    let cutout = foreground.to_rgba8();
    let (width, height) = cutout.dimensions();

    let mut written = Vec::with_capacity(backgrounds.len());
    for (index, background) in backgrounds.iter().enumerate() {
        let mut canvas = background
            .resize_to_fill(width, height, FilterType::Lanczos3)
            .to_rgba8();
        imageops::overlay(&mut canvas, &cutout, 0, 0);

        let name = composite_file_name(base_file_name, output_file_type, first_index + index);
        let path = output_dir.join(name);
        codec::write_image(&DynamicImage::ImageRgba8(canvas), &path)
            .map_err(|e| failed(e.to_string()))?;
        written.push(path);
    }

    Ok(written)
}
