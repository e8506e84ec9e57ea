//! The `skylab download` and `skylab download-all` commands.

use clap::Args;
use skylab_core::{Config, DownloadOptions, PhotoRef, StudioClient};

/// Arguments for the `download` command.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Id of the processed photo
    pub photo_id: u64,

    /// Output directory (name taken from the photo) or file path
    pub output: String,
}

/// Arguments for the `download-all` command.
#[derive(Args, Debug)]
pub struct DownloadAllArgs {
    /// Job whose photos are downloaded
    #[arg(long)]
    pub job: u64,

    /// Existing output directory
    pub output_dir: String,

    /// Override the configured number of concurrent downloads
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Execute the download command.
pub async fn execute(args: DownloadArgs, config: Config) -> anyhow::Result<()> {
    let output = super::expand_path(&args.output);
    let client = StudioClient::new(config)?;

    let outcome = client
        .download_photo(args.photo_id, &output, &DownloadOptions::default())
        .await?;
    super::print_json(&outcome)
}

/// Execute the download-all command.
pub async fn execute_all(args: DownloadAllArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(parallel) = args.parallel {
        config.transfer.max_download_concurrency = parallel;
    }
    let output_dir = super::expand_path(&args.output_dir);
    let client = StudioClient::new(config)?;

    let job = client.get_job(args.job).await?;
    let profile_id = job
        .profile_id
        .ok_or_else(|| anyhow::anyhow!("Job {} has no profile", args.job))?;

    let photos = client.list_job_photos(args.job).await?;
    tracing::info!("Job {} has {} photo(s)", args.job, photos.len());
    let refs: Vec<PhotoRef> = photos.iter().map(PhotoRef::from).collect();

    let result = client
        .download_all_photos(&refs, profile_id, &output_dir)
        .await?;
    super::print_json(&result)?;

    if !result.errored_photos.is_empty() {
        anyhow::bail!("{} photo(s) failed to download", result.errored_photos.len());
    }
    Ok(())
}
