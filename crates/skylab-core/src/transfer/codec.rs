//! Image decoding and encoding on top of the `image` crate.
//!
//! Decoding runs on the blocking pool; encoding helpers are synchronous and
//! are called from inside `spawn_blocking` by the downloader.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::TransferError;

/// Decode an in-memory buffer, detecting the format from its content.
pub async fn decode(bytes: Vec<u8>, source_name: &str) -> Result<DynamicImage, TransferError> {
    let name = source_name.to_string();
    tokio::task::spawn_blocking(move || decode_sync(bytes, &name))
        .await
        .map_err(|e| TransferError::Decode {
            source_name: source_name.to_string(),
            message: format!("Task join error: {e}"),
        })?
}

/// Synchronous decode from bytes (runs in spawn_blocking).
pub fn decode_sync(bytes: Vec<u8>, source_name: &str) -> Result<DynamicImage, TransferError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TransferError::Decode {
            source_name: source_name.to_string(),
            message: format!("Cannot detect image format: {e}"),
        })?;
    reader.decode().map_err(|e| TransferError::Decode {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Write an image, choosing the encoder from the path's extension.
///
/// Formats without an alpha channel (JPEG) get an RGB copy first.
pub fn write_image(image: &DynamicImage, path: &Path) -> Result<(), TransferError> {
    let encode_error = |message: String| TransferError::Encode {
        path: path.to_path_buf(),
        message,
    };

    let format = ImageFormat::from_path(path).map_err(|e| encode_error(e.to_string()))?;
    let result = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
    } else {
        image.save_with_format(path, format)
    };
    result.map_err(|e| encode_error(e.to_string()))
}

/// `name.ext` → `name.png`.
pub fn png_file_name(file_name: &str) -> String {
    with_extension(file_name, "png")
}

/// Replace (or add) the extension of a bare file name.
pub fn with_extension(file_name: &str, extension: &str) -> String {
    format!("{}.{}", file_stem(file_name), extension.trim_start_matches('.'))
}

/// File name without its last extension; dotfiles keep their name.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}
