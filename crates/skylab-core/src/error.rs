//! Error types for the Skylab Studio client.
//!
//! Errors are split by layer: the transport reports what the service (or the
//! network) said, the transfer layer reports what went wrong moving bytes and
//! materializing files. Transport errors pass through the transfer layer
//! unmodified.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for client operations.
#[derive(Error, Debug)]
pub enum StudioError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors reported by the HTTP transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Upload/download/compositing errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from the HTTP transport, mapped from response status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 404 from the API
    #[error("Resource not found: {0}")]
    InvalidEndpoint(String),

    /// 401 or 403
    #[error("Invalid api key")]
    InvalidKey,

    /// 400
    #[error("There was an error processing your request: {0}")]
    BadRequest(String),

    /// 429
    #[error("The rate limit has been met")]
    RateLimited,

    /// The connection could not be established or timed out
    #[error("The connection was refused: {0}")]
    ConnectionRefused(String),

    /// Any other status, or a body that could not be parsed
    #[error("An error has occurred (status {status:?}): {message}")]
    Unknown { status: Option<u16>, message: String },
}

/// Errors from the upload, download, and compositing pipeline.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Upload source has an unsupported extension
    #[error("Invalid file type for {path}: must be of type jpg/jpeg/png/webp")]
    InvalidFileType { path: PathBuf },

    /// Upload source exceeds the size limit
    #[error("Invalid file size for {path}: {size_bytes} bytes exceeds {max_mb}MB")]
    InvalidFileSize {
        path: PathBuf,
        size_bytes: u64,
        max_mb: u64,
    },

    /// The service did not create a photo record
    #[error(
        "Unable to create the photo record ({message}); for profile photos, \
         ensure enable_extract and replace_background are set"
    )]
    PhotoCreationFailed { message: String },

    /// Presigned upload failed after retrying
    #[error("Unable to upload photo {photo_id} to the bucket after {attempts} attempt(s): {message}")]
    UploadFailed {
        photo_id: u64,
        attempts: u32,
        message: String,
    },

    /// The processed asset is not available yet
    #[error("Invalid retouchedUrl {url:?}: ensure the job is complete")]
    InvalidRemoteAsset { url: String },

    /// The remote photo name is not a plain file name
    #[error("Photo {photo_id} has no usable file name: {name:?}")]
    InvalidFileName { photo_id: u64, name: String },

    /// Compositing onto a background failed
    #[error("Background replacement failed for {file_name}: {message}")]
    CompositingFailed { file_name: String, message: String },

    /// Batch output directory does not exist
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(PathBuf),

    /// Downloaded bytes could not be decoded
    #[error("Decode error for {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// An image could not be written to disk
    #[error("Failed to write {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

/// Convenience type alias for client results.
pub type Result<T> = std::result::Result<T, StudioError>;
