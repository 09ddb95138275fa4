//! Download policy
//!
//! Idempotent, retried transfer of one URL into one folder. Never returns an
//! error: every outcome is a [`Status`].

use crate::clients::FileFetcher;
use crate::config::Config;
use crate::models::Status;
use crate::services::answer_extractor::file_name_from_url;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::{debug, warn};

const FALLBACK_FILE_NAME: &str = "download";

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

/// Retry and simulate settings
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    pub dry_run: bool,
    pub retry_limit: u32,
    pub backoff: Duration,
}

impl DownloadPolicy {
    /// # Parameters
    /// - `config`: `dry_run`, `retry_limit` (at least one attempt) and
    ///   `retry_backoff` are taken from it
    pub fn from_config(config: &Config) -> Self {
        Self {
            dry_run: config.dry_run,
            retry_limit: config.retry_limit.max(1),
            backoff: config.retry_backoff,
        }
    }
}

/// Result of one [`Downloader::download`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub filename: String,
    pub status: Status,
}

pub struct Downloader<F> {
    fetcher: Arc<F>,
    policy: DownloadPolicy,
}

impl<F: FileFetcher> Downloader<F> {
    /// # Parameters
    /// - `fetcher`: shared with every other download of the run
    /// - `policy`: dry run and retry settings
    pub fn new(fetcher: Arc<F>, policy: DownloadPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Download `url` into `dest`.
    ///
    /// - target file already present: `SKIPPED`, never overwritten
    /// - dry run: `DRY_RUN`, no network access or write
    /// - otherwise up to `retry_limit` attempts with a fixed backoff between
    ///   them: `DOWNLOADED` or `FAILED`
    /// - another download published the same file name first: `SKIPPED`
    ///
    /// # Returns
    /// The file name used inside `dest` and the status to log
    pub async fn download(&self, url: &str, dest: &Path) -> DownloadOutcome {
        let filename = target_file_name(url);
        let path = dest.join(&filename);

        let status = if path.exists() {
            Status::Skipped
        } else if self.policy.dry_run {
            Status::DryRun
        } else {
            self.transfer(url, &path).await
        };

        DownloadOutcome { filename, status }
    }

    async fn transfer(&self, url: &str, path: &Path) -> Status {
        let attempts = self.policy.retry_limit.max(1);

        for attempt in 1..=attempts {
            match self.fetcher.fetch(url).await {
                Ok(response) if response.is_success() => {
                    match publish(path, &response.body).await {
                        Ok(Published::Written) => {
                            debug!("saved {} ({} bytes)", path.display(), response.body.len());
                            return Status::Downloaded;
                        }
                        Ok(Published::AlreadyPresent) => {
                            debug!("{} appeared while downloading, kept as is", path.display());
                            return Status::Skipped;
                        }
                        Err(e) => warn!(
                            "⚠️ Write failed for {} (attempt {}/{}): {}",
                            path.display(),
                            attempt,
                            attempts,
                            e
                        ),
                    }
                }
                Ok(response) => warn!(
                    "⚠️ HTTP {} for {} (attempt {}/{})",
                    response.status, url, attempt, attempts
                ),
                Err(e) => warn!(
                    "⚠️ Request failed for {} (attempt {}/{}): {}",
                    url, attempt, attempts, e
                ),
            }

            if attempt < attempts {
                sleep(self.policy.backoff).await;
            }
        }

        Status::Failed
    }
}

/// File name a URL is stored under: the decoded last path segment, with path
/// separators neutralised
pub fn target_file_name(url: &str) -> String {
    let name = file_name_from_url(url).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    let name = name.replace(['/', '\\'], "_");
    match name.as_str() {
        "." | ".." => FALLBACK_FILE_NAME.to_string(),
        _ => name,
    }
}

enum Published {
    Written,
    AlreadyPresent,
}

/// Unique per call, so concurrent downloads of the same name never share one
fn part_path(path: &Path) -> OsString {
    let mut part = path.as_os_str().to_owned();
    let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
    part.push(format!(".{}-{}.part", std::process::id(), seq));
    part
}

/// Write to a private part file, then link it into place without replacing
/// an existing file. An interrupted transfer never leaves a file a later run
/// would skip as complete.
async fn publish(path: &Path, body: &[u8]) -> std::io::Result<Published> {
    let part = part_path(path);
    tokio::fs::write(&part, body).await?;
    let linked = tokio::fs::hard_link(&part, path).await;
    if let Err(e) = tokio::fs::remove_file(&part).await {
        warn!("⚠️ Could not remove {}: {}", Path::new(&part).display(), e);
    }

    match linked {
        Ok(()) => Ok(Published::Written),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(Published::AlreadyPresent),
        // no hard links on this filesystem
        Err(_) => write_new(path, body).await,
    }
}

async fn write_new(path: &Path, body: &[u8]) -> std::io::Result<Published> {
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(Published::AlreadyPresent),
        Err(e) => return Err(e),
    };

    let written = async {
        file.write_all(body).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(path).await;
        return Err(e);
    }
    Ok(Published::Written)
}
