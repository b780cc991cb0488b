//! CLI entry point for the dsfetch tool.

use anyhow::Result;
use clap::Parser;
use dsfetch::HttpClient;
use dsfetch::commands::{
    ManifestSettings, MirrorSettings, run_manifest_command, run_mirror_command,
};
use dsfetch::mirror::DEFAULT_MIRROR_SEEDS;
use tracing::{debug, info};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // One pooled client for the whole run; downloads are strictly sequential.
    let client = HttpClient::new();

    let stats = match args.command {
        Command::Manifest {
            root,
            base_url,
            max_retries,
        } => {
            let settings = ManifestSettings {
                root,
                base_url,
                max_retries: u32::from(max_retries),
            };
            run_manifest_command(&client, &settings).await?
        }
        Command::Mirror {
            paths,
            base_url,
            out,
        } => {
            let seeds = if paths.is_empty() {
                DEFAULT_MIRROR_SEEDS.iter().map(ToString::to_string).collect()
            } else {
                paths
            };
            let settings = MirrorSettings {
                base_url,
                out_dir: out,
                seeds,
            };
            run_mirror_command(&client, &settings).await?
        }
    };

    info!(
        completed = stats.completed(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        retried = stats.retried(),
        total = stats.total(),
        "Run complete"
    );

    Ok(())
}
