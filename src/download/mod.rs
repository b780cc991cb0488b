//! HTTP download engine for streaming files to disk.
//!
//! This module provides the retrying downloader: a [`HttpClient`] that
//! streams response bodies to disk (skipping destinations that already
//! exist), a [`RetryPolicy`] implementing bounded exponential backoff, and
//! the sequential [`DownloadEngine`] that isolates per-task failures.
//!
//! # Example
//!
//! ```no_run
//! use dsfetch::download::{DownloadEngine, DownloadTask, HttpClient, RetryPolicy};
//! use std::path::PathBuf;
//!
//! # async fn example() {
//! let client = HttpClient::new();
//! let engine = DownloadEngine::new(RetryPolicy::default());
//! let task = DownloadTask::new(
//!     "https://example.com/getImage?SeriesInstanceUID=1.2.3",
//!     PathBuf::from("./out/series_1.zip"),
//!     "1.2.3",
//! );
//! let result = engine.run(&client, &task).await;
//! println!("{result:?}");
//! # }
//! ```

mod client;
mod engine;
mod error;
mod retry;

pub use client::{CONNECT_TIMEOUT_SECS, DownloadOutcome, HttpClient, READ_TIMEOUT_SECS};
pub use engine::{BatchStats, DownloadEngine, DownloadTask, TaskResult};
pub use error::DownloadError;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
