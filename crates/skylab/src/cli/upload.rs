//! The `skylab upload` command.

use clap::{ArgGroup, Args};
use skylab_core::{Config, OwnerRef, StudioClient};

/// Arguments for the `upload` command.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("owner").required(true).args(["job", "profile"])))]
pub struct UploadArgs {
    /// Image to upload (jpg, jpeg, png or webp)
    pub file: String,

    /// Upload into this job
    #[arg(long)]
    pub job: Option<u64>,

    /// Upload into this profile (background images)
    #[arg(long)]
    pub profile: Option<u64>,
}

impl UploadArgs {
    fn owner(&self) -> anyhow::Result<OwnerRef> {
        match (self.job, self.profile) {
            (Some(job_id), None) => Ok(OwnerRef::Job(job_id)),
            (None, Some(profile_id)) => Ok(OwnerRef::Profile(profile_id)),
            _ => anyhow::bail!("Specify exactly one of --job or --profile"),
        }
    }
}

/// Execute the upload command.
pub async fn execute(args: UploadArgs, config: Config) -> anyhow::Result<()> {
    let owner = args.owner()?;
    let path = super::expand_path(&args.file);
    let client = StudioClient::new(config)?;

    let result = client.upload_photo(&path, owner).await?;
    super::print_json(&result)
}
