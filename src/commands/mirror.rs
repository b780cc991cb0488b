//! Directory-listing mirror command.
//!
//! Walks index pages published by a static dataset host and mirrors the
//! discovered path hierarchy onto local directories exactly. Each index
//! page is saved as `index.html` in its mirrored directory and the saved
//! copy is what gets parsed - so an interrupted run resumes from disk
//! without re-fetching pages it already holds. Downloads use the
//! single-attempt policy: a failure is logged and skipped.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, warn};
use url::Url;

use crate::download::{
    BatchStats, DownloadEngine, DownloadTask, HttpClient, RetryPolicy, TaskResult,
};
use crate::mirror::{
    DEFAULT_MIRROR_BASE_URL, DEFAULT_MIRROR_SEEDS, LinkKind, classify_link, extract_hrefs,
    index_subpath, resolve_href,
};

/// Settings for a mirror-mode run.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// Base URL the seed paths are relative to.
    pub base_url: String,
    /// Local directory the remote hierarchy is mirrored under.
    pub out_dir: PathBuf,
    /// Seed paths: index pages to walk and/or files to fetch directly.
    pub seeds: Vec<String>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MIRROR_BASE_URL.to_string(),
            out_dir: PathBuf::from("."),
            seeds: DEFAULT_MIRROR_SEEDS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Runs the mirror download.
///
/// Per-item failures (unreachable page, failed file download, unreadable
/// saved index) are logged and skipped. Recursion terminates when no page
/// yields further index links; off-base links are never followed.
///
/// # Errors
///
/// Returns an error only if the base URL itself does not parse.
pub async fn run_mirror_command(
    client: &HttpClient,
    settings: &MirrorSettings,
) -> Result<BatchStats> {
    let mut base_url = settings.base_url.clone();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let base = Url::parse(&base_url)
        .with_context(|| format!("invalid base URL: {}", settings.base_url))?;

    let engine = DownloadEngine::new(RetryPolicy::no_retry());
    let mut stats = BatchStats::new();
    // Index pages still to visit, with the local directory each mirrors to.
    let mut pending: VecDeque<(Url, PathBuf)> = VecDeque::new();
    // Guards against self-referential index pages; already-visited pages
    // are not queued twice within a run.
    let mut visited: HashSet<Url> = HashSet::new();

    for seed in &settings.seeds {
        match classify_link(seed) {
            Some(LinkKind::Index) => match base.join(seed) {
                Ok(url) => {
                    let dir = settings.out_dir.join(index_subpath(seed));
                    if visited.insert(url.clone()) {
                        pending.push_back((url, dir));
                    }
                }
                Err(error) => warn!(seed, %error, "seed does not resolve, skipping"),
            },
            Some(LinkKind::File) => match base.join(seed) {
                Ok(url) => {
                    let dest = settings.out_dir.join(seed);
                    fetch_one(&engine, client, &mut stats, &url, &dest).await;
                }
                Err(error) => warn!(seed, %error, "seed does not resolve, skipping"),
            },
            None => warn!(seed, "seed is not a followable path, skipping"),
        }
    }

    while let Some((page_url, dir)) = pending.pop_front() {
        let index_dest = dir.join("index.html");
        let result = fetch_one(&engine, client, &mut stats, &page_url, &index_dest).await;
        if matches!(result, TaskResult::Failed { .. }) {
            continue;
        }

        // Parse the saved copy, whether it was just fetched or already on
        // disk from an earlier run.
        let html = match tokio::fs::read_to_string(&index_dest).await {
            Ok(html) => html,
            Err(error) => {
                error!(path = %index_dest.display(), %error, "cannot read saved index page");
                continue;
            }
        };

        for href in extract_hrefs(&html) {
            // Local placement comes from the resolved URL's path relative
            // to the base, so an absolute in-tree href lands in the same
            // directory as its relative equivalent.
            match classify_link(&href) {
                Some(LinkKind::Index) => match resolve_href(&page_url, &href) {
                    Ok(url) if url.as_str().starts_with(base.as_str()) => {
                        let sub_dir = settings.out_dir.join(index_subpath(rel_path(&base, &url)));
                        if visited.insert(url.clone()) {
                            pending.push_back((url, sub_dir));
                        } else {
                            debug!(%url, "index page already visited");
                        }
                    }
                    Ok(url) => debug!(%url, "index link leaves the mirrored tree, ignoring"),
                    Err(error) => warn!(href, %error, "unresolvable index link"),
                },
                Some(LinkKind::File) => match resolve_href(&page_url, &href) {
                    Ok(url) if url.as_str().starts_with(base.as_str()) => {
                        let rel = rel_path(&base, &url);
                        if rel.is_empty() {
                            warn!(%url, "file link has no path under the base, skipping");
                            continue;
                        }
                        let dest = settings.out_dir.join(rel);
                        fetch_one(&engine, client, &mut stats, &url, &dest).await;
                    }
                    Ok(url) => debug!(%url, "file link leaves the mirrored tree, ignoring"),
                    Err(error) => warn!(href, %error, "unresolvable file link"),
                },
                None => debug!(href, "ignoring link"),
            }
        }
    }

    Ok(stats)
}

/// Downloads one URL to `dest`, printing python-mirror-style progress lines
/// and recording the outcome.
async fn fetch_one(
    engine: &DownloadEngine,
    client: &HttpClient,
    stats: &mut BatchStats,
    url: &Url,
    dest: &Path,
) -> TaskResult {
    println!("Downloading: {url}");
    let task = DownloadTask::new(url.as_str(), dest, url.as_str());
    let result = engine.run(client, &task).await;
    match &result {
        TaskResult::Completed { .. } => println!("Downloaded: {}", dest.display()),
        TaskResult::Skipped => println!("File already exists: {}", dest.display()),
        TaskResult::Failed { error, .. } => println!("Failed to download: {url} ({error})"),
    }
    stats.record(&result);
    result
}

/// Path of an in-tree URL relative to the mirror base.
///
/// The caller has already checked the URL string starts with the base, so
/// the fallback is effectively unreachable.
fn rel_path<'a>(base: &Url, url: &'a Url) -> &'a str {
    url.path().strip_prefix(base.path()).unwrap_or("")
}
