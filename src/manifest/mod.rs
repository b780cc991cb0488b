//! TCIA `.tcia` manifest parsing and discovery.
//!
//! A manifest is a line-oriented UTF-8 text file: `key=value` configuration
//! lines up to the sentinel key `ListOfSeriesToDownload`, after which every
//! non-blank line is an opaque Series Instance UID. The series order in the
//! file is the download order.
//!
//! # Example
//!
//! ```
//! use dsfetch::manifest::Manifest;
//!
//! let manifest = Manifest::parse_str(
//!     "downloadServerUrl=https://example.org/download\n\
//!      ListOfSeriesToDownload=\n\
//!      1.2.840.1\n\
//!      1.2.840.2\n",
//! );
//! assert_eq!(manifest.series().len(), 2);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Key that separates configuration lines from the series list.
pub const SERIES_LIST_SENTINEL: &str = "ListOfSeriesToDownload";

/// File extension used when discovering manifests.
pub const MANIFEST_EXTENSION: &str = "tcia";

/// Default base URL of the TCIA NBIA REST API.
pub const DEFAULT_IMAGE_BASE_URL: &str =
    "https://services.cancerimagingarchive.net/nbia-api/services/v1";

/// Errors that can occur while loading or discovering manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File system error reading a manifest or scanning a dataset root.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A parsed `.tcia` manifest: scalar configuration plus the ordered series
/// list.
///
/// Series UIDs are opaque strings; no format validation is applied and
/// duplicates are preserved (they download redundantly, by position).
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    config: HashMap<String, String>,
    series: Vec<String>,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// Blank lines are skipped everywhere. Before the sentinel, lines
    /// containing `=` are split on the first `=` into trimmed key/value
    /// pairs; lines without `=` are ignored. After the sentinel, every
    /// non-blank line is taken verbatim as a series UID, even if it
    /// contains `=`.
    ///
    /// Malformed or empty input yields an empty series list, never an
    /// error.
    #[must_use]
    pub fn parse_str(input: &str) -> Self {
        let mut config = HashMap::new();
        let mut series = Vec::new();
        let mut reading_series = false;

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if reading_series {
                series.push(line.to_string());
            } else if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key == SERIES_LIST_SENTINEL {
                    reading_series = true;
                } else {
                    config.insert(key.to_string(), value.trim().to_string());
                }
            }
            // Pre-sentinel lines without '=' carry no information; skip them.
        }

        Self { config, series }
    }

    /// Loads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
        let manifest = Self::parse_str(&text);
        debug!(
            path = %path.display(),
            config_keys = manifest.config.len(),
            series = manifest.series.len(),
            "parsed manifest"
        );
        Ok(manifest)
    }

    /// Returns a configuration value by key, if present before the sentinel.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// The `downloadServerUrl` configuration value, if present.
    #[must_use]
    pub fn download_server_url(&self) -> Option<&str> {
        self.config("downloadServerUrl")
    }

    /// The `databasketId` configuration value, if present.
    #[must_use]
    pub fn databasket_id(&self) -> Option<&str> {
        self.config("databasketId")
    }

    /// The `includeAnnotation` flag, defaulting to `"true"` when absent.
    #[must_use]
    pub fn include_annotation(&self) -> &str {
        self.config("includeAnnotation").unwrap_or("true")
    }

    /// The ordered series UIDs listed after the sentinel.
    #[must_use]
    pub fn series(&self) -> &[String] {
        &self.series
    }

    /// Returns true if the manifest lists no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Builds the `getImage` URL for one series UID.
#[must_use]
pub fn series_image_url(base_url: &str, uid: &str) -> String {
    format!(
        "{}/getImage?SeriesInstanceUID={uid}",
        base_url.trim_end_matches('/')
    )
}

/// Recursively collects all `.tcia` manifest files under `root`.
///
/// Results are sorted for a deterministic processing order. A missing or
/// unreadable directory is an error; an empty result is not (the driver
/// decides whether that is fatal).
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if a directory cannot be read.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let mut manifests = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| ManifestError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ManifestError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
            {
                manifests.push(path);
            }
        }
    }

    manifests.sort();
    Ok(manifests)
}

/// Derives the output directory for a manifest: the manifest's base name
/// (extension stripped) in the manifest's own directory.
///
/// `D/foo.tcia` maps to `D/foo`.
#[must_use]
pub fn output_dir_for(manifest_path: &Path) -> PathBuf {
    manifest_path.with_extension("")
}
