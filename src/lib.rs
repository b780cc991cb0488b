//! dsfetch Core Library
//!
//! This library provides the core functionality for the dsfetch tool, which
//! batch-downloads public imaging/geospatial datasets: image series referenced
//! by TCIA `.tcia` manifest files, and static file trees published behind
//! HTML directory listings.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - `.tcia` manifest parsing, discovery, output-dir naming
//! - [`download`] - Streaming HTTP downloader with retry/backoff
//! - [`mirror`] - Anchor-link extraction and classification for index pages
//! - [`commands`] - Drivers behind the CLI subcommands

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod download;
pub mod manifest;
pub mod mirror;

// Re-export commonly used types
pub use download::{
    BatchStats, DEFAULT_MAX_RETRIES, DownloadEngine, DownloadError, DownloadOutcome, DownloadTask,
    FailureType, HttpClient, RetryDecision, RetryPolicy, TaskResult, classify_error,
};
pub use manifest::{Manifest, ManifestError, find_manifests, output_dir_for, series_image_url};
pub use mirror::{LinkKind, classify_link, extract_hrefs, resolve_href};
