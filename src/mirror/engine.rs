//! Traversal engine: walks the remote tree level by level and keeps the
//! local mirror in sync with it.
//!
//! The walk is a breadth-first traversal over directory URLs. Each round
//! visits the current frontier as one barrier batch; visiting a directory
//! fetches its listing page into a cache file, parses it, downloads the
//! directory's files (another barrier batch, each file gated by the
//! ledger), and emits its subdirectories into the next frontier. The run
//! terminates when the frontier is empty.
//!
//! A visited set keyed by directory URL guarantees termination even if
//! the remote index links cyclically; without it the traversal would rely
//! on the remote being a finite acyclic tree.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::MirrorError;
use crate::batch::run_batched;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::ledger::{Ledger, RecordState};
use crate::listing;

/// Counters for one mirroring run.
///
/// Updated from concurrent jobs within a batch, hence atomics.
#[derive(Debug, Default)]
pub struct MirrorStats {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    dirs_visited: AtomicUsize,
}

impl MirrorStats {
    /// Creates a stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files transferred during this run.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Files skipped because the ledger showed them already done.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Files whose fetch failed after retries; retried on the next run.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Directories visited.
    #[must_use]
    pub fn dirs_visited(&self) -> usize {
        self.dirs_visited.load(Ordering::SeqCst)
    }

    fn increment_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_dirs_visited(&self) {
        self.dirs_visited.fetch_add(1, Ordering::SeqCst);
    }
}

/// Breadth-first mirroring engine.
///
/// Holds the run configuration, the persistent ledger, and the fetcher.
/// All fetch and ledger operations are multiplexed on the Tokio runtime;
/// the only shared mutable state is the ledger, whose writes are
/// URL-keyed upserts.
#[derive(Debug, Clone)]
pub struct MirrorEngine {
    config: Arc<Config>,
    ledger: Ledger,
    fetcher: Fetcher,
}

impl MirrorEngine {
    /// Creates an engine over a configuration and an open ledger.
    #[must_use]
    pub fn new(config: Arc<Config>, ledger: Ledger) -> Self {
        let fetcher = Fetcher::new(config.timeout(), config.retry_limit());
        Self {
            config,
            ledger,
            fetcher,
        }
    }

    /// Runs the full traversal from the configured root URL.
    ///
    /// Interrupting the process mid-run is safe: completed files are
    /// recorded done, in-flight ones stay not-done, and the next run
    /// resumes from that state without redoing finished work.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError`] on listing-fetch, parse, ledger, or
    /// filesystem failures. Per-file fetch failures are absorbed and
    /// reported through [`MirrorStats::failed`].
    #[instrument(skip(self), fields(root = %self.config.root_url()))]
    pub async fn run(&self) -> Result<MirrorStats, MirrorError> {
        let stats = MirrorStats::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![self.config.root_url().clone()];
        let mut round = 0usize;

        while !frontier.is_empty() {
            round += 1;
            // Cycle guard: drop anything already visited, including
            // duplicates discovered within the same round.
            frontier.retain(|dir| visited.insert(dir.as_str().to_string()));
            if frontier.is_empty() {
                break;
            }

            debug!(round, dirs = frontier.len(), "visiting frontier");

            let jobs: Vec<_> = frontier
                .iter()
                .map(|dir| self.visit_dir(dir, &stats))
                .collect();
            let outcomes = run_batched(jobs, self.config.concurrency()).await;

            let mut next = Vec::new();
            for outcome in outcomes {
                next.extend(outcome?);
            }
            frontier = next;
        }

        info!(
            downloaded = stats.downloaded(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            dirs = stats.dirs_visited(),
            rounds = round,
            "traversal complete"
        );

        Ok(stats)
    }

    /// Visits one remote directory and returns its subdirectory URLs.
    ///
    /// Creates the mirrored local directory, fetches the listing page
    /// into its cache file, parses it, and downloads the directory's
    /// files as one barrier batch.
    #[instrument(skip(self, stats), fields(url = %dir_url))]
    async fn visit_dir(
        &self,
        dir_url: &Url,
        stats: &MirrorStats,
    ) -> Result<Vec<Url>, MirrorError> {
        let local_dir = self.config.save_path(dir_url)?;
        fs::create_dir_all(&local_dir)
            .await
            .map_err(|e| MirrorError::io(&local_dir, e))?;

        let cache_path = self.config.listing_cache_path(dir_url);
        match self.fetcher.fetch_to_file(dir_url, &cache_path).await {
            Ok(report) => {
                self.log_fetch(dir_url, &report.summary(), "").await;
            }
            Err(e) => {
                self.log_fetch(dir_url, "", &e.to_string()).await;
                return Err(MirrorError::ListingFetch {
                    url: dir_url.to_string(),
                    source: e,
                });
            }
        }

        let html = fs::read_to_string(&cache_path)
            .await
            .map_err(|e| MirrorError::io(&cache_path, e))?;
        let entries = listing::parse(&html).map_err(|e| MirrorError::ListingParse {
            url: dir_url.to_string(),
            source: e,
        })?;

        info!(
            url = %dir_url,
            files = entries.files.len(),
            dirs = entries.dirs.len(),
            "listing parsed"
        );

        let mut file_urls = Vec::with_capacity(entries.files.len());
        for name in &entries.files {
            file_urls.push(join_entry(dir_url, name)?);
        }

        let jobs: Vec<_> = file_urls
            .iter()
            .map(|file_url| self.download_file(file_url, stats))
            .collect();
        for outcome in run_batched(jobs, self.config.concurrency()).await {
            outcome?;
        }

        stats.increment_dirs_visited();

        let mut subdirs = Vec::with_capacity(entries.dirs.len());
        for name in &entries.dirs {
            subdirs.push(join_entry(dir_url, name)?);
        }
        Ok(subdirs)
    }

    /// Downloads one file if the ledger does not show it done.
    ///
    /// The validity gate: a consistent record skips the download; a stale
    /// record is repaired first; missing and pending records download.
    /// Fetch failures are absorbed here (the record stays not-done),
    /// ledger failures propagate.
    #[instrument(skip(self, stats), fields(url = %url))]
    async fn download_file(&self, url: &Url, stats: &MirrorStats) -> Result<(), MirrorError> {
        let local_path = self.config.save_path(url)?;

        match self.ledger.check(url.as_str(), &local_path).await? {
            RecordState::Consistent => {
                debug!(url = %url, "already downloaded, skipping");
                stats.increment_skipped();
                return Ok(());
            }
            RecordState::Stale => {
                info!(url = %url, "local file no longer matches record, resetting");
                self.ledger.repair(url.as_str(), &local_path).await?;
            }
            RecordState::Missing | RecordState::Pending => {}
        }

        self.ledger.begin(url.as_str(), &local_path).await?;

        match self.fetcher.fetch_to_file(url, &local_path).await {
            Ok(report) => {
                self.log_fetch(url, &report.summary(), "").await;
                self.ledger.complete(url.as_str(), &local_path).await?;
                info!(url = %url, bytes = report.bytes, "download succeeded");
                stats.increment_downloaded();
            }
            Err(e) => {
                self.log_fetch(url, "", &e.to_string()).await;
                error!(url = %url, error = %e, "download failed");
                stats.increment_failed();
            }
        }

        Ok(())
    }

    /// Best-effort write to the diagnostic fetch log.
    async fn log_fetch(&self, url: &Url, stdout: &str, stderr: &str) {
        if let Err(e) = self.ledger.record_fetch(url.as_str(), stdout, stderr).await {
            warn!(url = %url, error = %e, "failed to record fetch log entry");
        }
    }
}

/// Joins a listing entry onto its directory URL.
fn join_entry(dir_url: &Url, entry: &str) -> Result<Url, MirrorError> {
    dir_url.join(entry).map_err(|e| MirrorError::InvalidEntry {
        dir_url: dir_url.to_string(),
        entry: entry.to_string(),
        source: e,
    })
}
