//! Manifest-driven batch download command.
//!
//! Discovers `.tcia` manifests under a dataset root, derives an output
//! directory per manifest (base name, extension stripped, sibling of the
//! manifest), and downloads every listed series in order with the
//! retry/backoff policy. Output names are positional (`series_<n>.zip`);
//! the series-to-file correspondence is by position and log line.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{error, info};

use crate::download::{BatchStats, DownloadEngine, DownloadTask, HttpClient, RetryPolicy};
use crate::manifest::{
    DEFAULT_IMAGE_BASE_URL, Manifest, find_manifests, output_dir_for, series_image_url,
};

/// Settings for a manifest-mode run. Every value the original scripts
/// hard-coded is explicit here so tests can substitute a mock server.
#[derive(Debug, Clone)]
pub struct ManifestSettings {
    /// Dataset root scanned recursively for `.tcia` files.
    pub root: PathBuf,
    /// Base URL of the imaging archive API.
    pub base_url: String,
    /// Maximum attempts per series (including the first).
    pub max_retries: u32,
}

impl ManifestSettings {
    /// Settings with the production archive URL and default retry bound.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            max_retries: crate::download::DEFAULT_MAX_RETRIES,
        }
    }
}

/// Runs the manifest-driven batch download.
///
/// The only fatal error is discovery finding no manifests (or the root
/// being unreadable). Everything downstream is isolated per item: an
/// unreadable manifest or a failing series is logged and the run moves on.
///
/// # Errors
///
/// Returns an error if the dataset root cannot be scanned or contains no
/// `.tcia` files.
pub async fn run_manifest_command(
    client: &HttpClient,
    settings: &ManifestSettings,
) -> Result<BatchStats> {
    let manifests = find_manifests(&settings.root)
        .with_context(|| format!("scanning {} for manifests", settings.root.display()))?;
    if manifests.is_empty() {
        bail!(
            "no .tcia manifest files found under {}",
            settings.root.display()
        );
    }

    println!(
        "Found {} .tcia manifest file(s). Starting downloads...",
        manifests.len()
    );
    info!(
        manifests = manifests.len(),
        base_url = %settings.base_url,
        max_retries = settings.max_retries,
        "starting manifest batch"
    );

    let engine = DownloadEngine::new(RetryPolicy::with_max_attempts(settings.max_retries));
    let mut totals = BatchStats::new();

    for manifest_path in &manifests {
        let manifest = match Manifest::load(manifest_path) {
            Ok(manifest) => manifest,
            Err(error) => {
                error!(path = %manifest_path.display(), %error, "skipping unreadable manifest");
                continue;
            }
        };

        let output_dir = output_dir_for(manifest_path);
        println!(
            "\nDownloading series for manifest: {}",
            manifest_path.display()
        );
        println!("Saving into folder: {}", output_dir.display());

        if let Err(error) = tokio::fs::create_dir_all(&output_dir).await {
            error!(
                dir = %output_dir.display(),
                %error,
                "cannot create output directory, skipping manifest"
            );
            continue;
        }

        let tasks: Vec<DownloadTask> = manifest
            .series()
            .iter()
            .enumerate()
            .map(|(index, uid)| {
                DownloadTask::new(
                    series_image_url(&settings.base_url, uid),
                    output_dir.join(format!("series_{}.zip", index + 1)),
                    uid.clone(),
                )
            })
            .collect();

        let stats = engine.run_batch(client, &tasks).await;
        totals.merge(&stats);
    }

    Ok(totals)
}
