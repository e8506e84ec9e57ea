//! Skylab CLI - upload photos to Skylab Studio and download the processed results.
//!
//! # Usage
//!
//! ```bash
//! # Upload a photo into a job
//! skylab upload shot.jpg --job 42
//!
//! # Upload a background into a profile
//! skylab upload background.png --profile 7
//!
//! # Download one processed photo
//! skylab download 1234 ./out/
//!
//! # Download every photo of a job
//! skylab download-all --job 42 ./out/
//!
//! # View configuration
//! skylab config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Skylab - upload and download Skylab Studio photos.
#[derive(Parser, Debug)]
#[command(name = "skylab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "SKYLAB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local image into a job or profile
    Upload(cli::upload::UploadArgs),

    /// Download one processed photo
    Download(cli::download::DownloadArgs),

    /// Download every photo of a job
    DownloadAll(cli::download::DownloadAllArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `skylab config path`."
            );
            skylab_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Skylab v{}", skylab_core::VERSION);

    match cli.command {
        Commands::Upload(args) => cli::upload::execute(args, config).await,
        Commands::Download(args) => cli::download::execute(args, config).await,
        Commands::DownloadAll(args) => cli::download::execute_all(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
