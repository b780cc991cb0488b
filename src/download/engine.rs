//! Sequential download engine with retry support.
//!
//! The engine runs [`DownloadTask`]s strictly one at a time: one HTTP
//! request in flight, one file being written. Each task is wrapped in the
//! retry loop driven by [`RetryPolicy`]; a task that exhausts its attempts
//! is abandoned and reported in the batch stats, never propagated as an
//! error - one failing download must not prevent subsequent downloads.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::client::{DownloadOutcome, HttpClient};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::DownloadError;

/// One unit of download work: source URL, destination path, and the
/// human-readable label used in progress lines (a series UID or an href).
///
/// Constructed from a manifest entry or a scraped link, consumed exactly
/// once by the engine.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Source URL.
    pub url: String,
    /// Destination file path.
    pub dest: PathBuf,
    /// Identity shown in progress and log lines.
    pub label: String,
}

impl DownloadTask {
    /// Creates a new download task.
    #[must_use]
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            label: label.into(),
        }
    }
}

/// Terminal state of one task after the retry loop.
#[derive(Debug)]
pub enum TaskResult {
    /// The content was downloaded.
    Completed {
        /// Body bytes written.
        bytes: u64,
        /// Number of attempts used (1 = no retries).
        attempts: u32,
    },
    /// The destination already existed; nothing was fetched.
    Skipped,
    /// All attempts failed; the task was abandoned.
    Failed {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        error: DownloadError,
    },
}

/// Statistics from a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    completed: usize,
    skipped: usize,
    failed: usize,
    retried: usize,
}

impl BatchStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successfully completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of tasks skipped because the destination already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of abandoned tasks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of retry attempts made across all tasks.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried
    }

    /// Total number of tasks processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }

    /// Folds another batch's counts into this one (used when a run spans
    /// several manifests).
    pub fn merge(&mut self, other: &BatchStats) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.retried += other.retried;
    }

    /// Records a task result.
    pub fn record(&mut self, result: &TaskResult) {
        match result {
            TaskResult::Completed { attempts, .. } => {
                self.completed += 1;
                self.retried += (*attempts as usize).saturating_sub(1);
            }
            TaskResult::Skipped => self.skipped += 1,
            TaskResult::Failed { attempts, .. } => {
                self.failed += 1;
                self.retried += (*attempts as usize).saturating_sub(1);
            }
        }
    }
}

/// Sequential download engine.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    policy: RetryPolicy,
}

impl DownloadEngine {
    /// Creates an engine with the given retry policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the engine's retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs one task through the retry loop.
    ///
    /// Transient failures sleep the backoff delay and try again while the
    /// policy allows; permanent failures and exhausted attempts abandon the
    /// task. Failure is reported in the [`TaskResult`], never as `Err`.
    pub async fn run(&self, client: &HttpClient, task: &DownloadTask) -> TaskResult {
        let mut attempt = 1u32;
        loop {
            match client.download_to_path(&task.url, &task.dest).await {
                Ok(DownloadOutcome::Downloaded { bytes }) => {
                    debug!(label = %task.label, bytes, attempt, "task completed");
                    return TaskResult::Completed { bytes, attempts: attempt };
                }
                Ok(DownloadOutcome::SkippedExisting) => {
                    debug!(label = %task.label, "task skipped, destination exists");
                    return TaskResult::Skipped;
                }
                Err(error) => {
                    let failure_type = classify_error(&error);
                    match self.policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry { delay, attempt: next_attempt } => {
                            warn!(
                                label = %task.label,
                                attempt,
                                delay_secs = delay.as_secs_f64(),
                                error = %error,
                                "attempt failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next_attempt;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(
                                label = %task.label,
                                attempts = attempt,
                                error = %error,
                                reason,
                                "abandoning task"
                            );
                            return TaskResult::Failed {
                                attempts: attempt,
                                error,
                            };
                        }
                    }
                }
            }
        }
    }

    /// Runs a batch of tasks strictly sequentially, printing a
    /// `[index/total]` progress line per task.
    pub async fn run_batch(&self, client: &HttpClient, tasks: &[DownloadTask]) -> BatchStats {
        let total = tasks.len();
        let mut stats = BatchStats::new();

        for (index, task) in tasks.iter().enumerate() {
            println!("[{}/{}] {}", index + 1, total, task.label);
            let result = self.run(client, task).await;
            match &result {
                TaskResult::Completed { bytes, .. } => {
                    println!("  saved {} ({bytes} bytes)", task.dest.display());
                }
                TaskResult::Skipped => {
                    println!("  already exists: {}", task.dest.display());
                }
                TaskResult::Failed { attempts, error } => {
                    println!("  failed after {attempts} attempt(s): {error}");
                }
            }
            stats.record(&result);
        }

        info!(
            completed = stats.completed(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            retried = stats.retried(),
            "batch finished"
        );
        stats
    }
}
