//! HTTP fetcher: retrieves a URL into a destination file.
//!
//! This is the single transfer primitive of the crate. It owns its retry
//! loop (callers never retry on top of it) and enforces the configured
//! wall-clock timeout per attempt through the underlying client. The
//! response body is streamed to disk so large archive files never sit in
//! memory.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};

/// Outcome of a successful fetch, kept for the diagnostic fetch log.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Final HTTP status code.
    pub status: u16,
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

impl FetchReport {
    /// One-line human-readable summary for the fetch log.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "HTTP {}, {} bytes, {} attempt(s)",
            self.status, self.bytes, self.attempts
        )
    }
}

/// HTTP fetcher with internal bounded retry.
///
/// Create once and reuse; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher with a per-attempt timeout and a retry limit.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(timeout: Duration, retry_limit: u32) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            policy: RetryPolicy::new(retry_limit),
        }
    }

    /// Fetches `url` into the file at `dest`, overwriting it.
    ///
    /// Transient failures are retried internally up to the configured
    /// limit with exponential backoff; each attempt is bounded by the
    /// configured timeout. The destination holds whatever the last
    /// attempt wrote; on failure the caller's ledger entry stays
    /// not-done, so a partial file is retried on the next run.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] once retries are exhausted or a
    /// permanent failure is hit.
    #[instrument(skip(self, dest), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch_to_file(&self, url: &Url, dest: &Path) -> Result<FetchReport, FetchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "fetch attempt");

            match self.try_fetch(url, dest).await {
                Ok((status, bytes)) => {
                    return Ok(FetchReport {
                        status,
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let failure_type = classify_error(&e);
                    match self.policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry { delay } => {
                            warn!(
                                url = %url,
                                attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                error = %e,
                                "retrying fetch"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(url = %url, %reason, "not retrying fetch");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// One attempt: request, status check, streaming write.
    async fn try_fetch(&self, url: &Url, dest: &Path) -> Result<(u16, u64), FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::request(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }

        let file = File::create(dest)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::request(url.as_str(), e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(dest, e))?;
            bytes += chunk.len() as u64;
        }

        writer.flush().await.map_err(|e| FetchError::io(dest, e))?;

        Ok((status.as_u16(), bytes))
    }
}
