//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with proper timeout configuration and error handling. The
//! "already downloaded" check lives here too: a destination that exists is
//! skipped without issuing any request, which is the batch resume mechanism
//! (no byte-range resuming).

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, ClientBuilder, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::DownloadError;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes, for large series archives).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Outcome of a `download_to_path` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The remote content was fetched and written to the destination.
    Downloaded {
        /// Number of body bytes written.
        bytes: u64,
    },
    /// The destination already existed; no request was issued and the
    /// existing file was left untouched.
    SkippedExisting,
}

/// HTTP client for downloading files with streaming support.
///
/// Designed to be created once and reused for every download in a batch,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues a GET request and checks the response status.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if `url` does not parse
    /// - [`DownloadError::Network`] for transport-level failures
    /// - [`DownloadError::HttpStatus`] for non-2xx responses
    pub async fn get(&self, url: &str) -> Result<Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Ensures the remote content at `url` is materialized at `dest`.
    ///
    /// If `dest` already exists the call is a no-op and returns
    /// [`DownloadOutcome::SkippedExisting`] without touching the network.
    /// Otherwise the response body is streamed chunk-by-chunk to `dest`
    /// (truncate-then-write), creating parent directories first. The full
    /// payload is never buffered in memory.
    ///
    /// A destination file only persists when the body was written to the
    /// end: on any failure after the file is created (truncated body,
    /// write error) the partial file is removed before the error is
    /// returned. A file that exists is therefore a completed download,
    /// which is what lets the existence check double as the resume signal.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`], [`DownloadError::Network`],
    ///   [`DownloadError::HttpStatus`] from the request
    /// - [`DownloadError::Io`] for directory/file creation or write failures
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        dest: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        if dest.exists() {
            debug!("destination exists, skipping download");
            return Ok(DownloadOutcome::SkippedExisting);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let response = self.get(url).await?;

        match Self::stream_to_file(response, url, dest).await {
            Ok(bytes_written) => {
                debug!(bytes = bytes_written, "download complete");
                Ok(DownloadOutcome::Downloaded {
                    bytes: bytes_written,
                })
            }
            Err(error) => {
                // A truncated file must not satisfy the existence check on
                // the next attempt.
                if let Err(remove_error) = tokio::fs::remove_file(dest).await {
                    if remove_error.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            path = %dest.display(),
                            %remove_error,
                            "could not remove partial file"
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// Streams the response body into a freshly created `dest`, returning
    /// the number of bytes written.
    async fn stream_to_file(
        response: Response,
        url: &str,
        dest: &Path,
    ) -> Result<u64, DownloadError> {
        let file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(dest, e))?;
            bytes_written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        Ok(bytes_written)
    }
}
