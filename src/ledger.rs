//! Persistent download ledger: the idempotency memory of the mirror.
//!
//! One row per distinct remote file URL records where the file is saved
//! locally and whether its transfer completed. The ledger is upsert-only
//! and keyed by URL, so concurrent writers to different URLs never
//! conflict and the same URL resolves last-write-wins. Rows are never
//! deleted; URLs that disappear from the remote simply go stale.
//!
//! The consistency check is split into an explicit two-step API:
//! [`Ledger::check`] is a pure query classifying a record against the
//! filesystem, and [`Ledger::repair`] rewrites a stale record to
//! not-done. Callers invoke `repair` exactly when `check` reports
//! [`RecordState::Stale`], which reproduces self-healing resume behavior
//! without hiding the write inside a query.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::Database;

/// Ledger persistence errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A query against the ledger database failed.
    #[error("ledger query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Classification of a download record against the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// No record exists for this URL; it has never been attempted.
    Missing,

    /// A record exists but the transfer never completed.
    Pending,

    /// The record claims completion, but the file is gone from disk or
    /// the stored path no longer matches the path the URL maps to.
    Stale,

    /// The record claims completion and the file exists at the matching
    /// path. The download can be skipped.
    Consistent,
}

/// Persistent ledger of per-URL download records plus the diagnostic
/// fetch log.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    /// Wraps an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Classifies the record for `url` against `expected_path`.
    ///
    /// `expected_path` is the path the URL currently maps to; a done
    /// record only counts as [`RecordState::Consistent`] if a file exists
    /// there and the stored path agrees. This method never writes; a
    /// [`RecordState::Stale`] result is fixed by calling [`repair`].
    ///
    /// [`repair`]: Self::repair
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Query`] if the database read fails.
    #[instrument(skip(self, expected_path), fields(url = %url))]
    pub async fn check(&self, url: &str, expected_path: &Path) -> Result<RecordState, LedgerError> {
        let row: Option<(bool, String)> =
            sqlx::query_as("SELECT done, local_path FROM files WHERE url = ?")
                .bind(url)
                .fetch_optional(self.db.pool())
                .await?;

        let Some((done, stored_path)) = row else {
            return Ok(RecordState::Missing);
        };

        if !done {
            return Ok(RecordState::Pending);
        }

        let expected = expected_path.to_string_lossy();
        if stored_path == expected && expected_path.is_file() {
            debug!(url = %url, "record consistent");
            Ok(RecordState::Consistent)
        } else {
            debug!(url = %url, stored_path = %stored_path, "done record no longer matches disk");
            Ok(RecordState::Stale)
        }
    }

    /// Rewrites a stale record to not-done with the expected path.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Query`] if the database write fails.
    #[instrument(skip(self, expected_path), fields(url = %url))]
    pub async fn repair(&self, url: &str, expected_path: &Path) -> Result<(), LedgerError> {
        self.upsert(url, expected_path, false).await
    }

    /// Upserts a not-done record before a transfer is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Query`] if the database write fails.
    #[instrument(skip(self, local_path), fields(url = %url))]
    pub async fn begin(&self, url: &str, local_path: &Path) -> Result<(), LedgerError> {
        self.upsert(url, local_path, false).await
    }

    /// Upserts a done record after a successful transfer.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Query`] if the database write fails.
    #[instrument(skip(self, local_path), fields(url = %url))]
    pub async fn complete(&self, url: &str, local_path: &Path) -> Result<(), LedgerError> {
        self.upsert(url, local_path, true).await
    }

    /// Upserts the diagnostic fetch-log row for `url`.
    ///
    /// One row per URL, latest invocation wins. This table has no bearing
    /// on ledger correctness; callers treat failures as non-fatal.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Query`] if the database write fails.
    #[instrument(skip(self, stdout, stderr), fields(url = %url))]
    pub async fn record_fetch(
        &self,
        url: &str,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), LedgerError> {
        sqlx::query("INSERT OR REPLACE INTO fetch_log (url, stdout, stderr) VALUES (?, ?, ?)")
            .bind(url)
            .bind(stdout)
            .bind(stderr)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn upsert(&self, url: &str, local_path: &Path, done: bool) -> Result<(), LedgerError> {
        sqlx::query("INSERT OR REPLACE INTO files (url, local_path, done) VALUES (?, ?, ?)")
            .bind(url)
            .bind(local_path.to_string_lossy().into_owned())
            .bind(done)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
