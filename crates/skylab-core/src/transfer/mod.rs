//! The transfer pipeline: upload, download, compositing, and batching.

pub mod batch;
pub mod codec;
pub mod composite;
pub mod download;
pub mod retry;
pub mod upload;

pub use batch::BatchDownloader;
pub use composite::{composite_file_name, composite_onto_backgrounds, load_backgrounds, BackgroundSet};
pub use download::{resolve_output_path, DownloadOptions, Downloader, OutputPlan};
pub use retry::{Backoff, Delay, RetryPolicy, TokioDelay};
pub use upload::{content_md5, validate_upload_source, Uploader};
