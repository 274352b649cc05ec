//! Error types for the traversal engine.
//!
//! Per-file fetch failures are absorbed inside the engine (the ledger row
//! stays not-done and the next run retries them), so they never appear
//! here. Everything below aborts the run: listing fetches, parsing,
//! ledger access, and filesystem operations have no safe skip path.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::ledger::LedgerError;
use crate::listing::ListingError;

/// Fatal errors raised during traversal.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A URL could not be mapped onto the local tree.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The ledger database failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A directory's listing page could not be fetched.
    #[error("failed to fetch listing for {url}: {source}")]
    ListingFetch {
        /// The directory URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// A fetched listing page could not be parsed.
    #[error("failed to parse listing for {url}: {source}")]
    ListingParse {
        /// The directory URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: ListingError,
    },

    /// A listing entry did not join into a valid child URL.
    #[error("listing entry {entry:?} under {dir_url} is not a valid URL: {source}")]
    InvalidEntry {
        /// The directory whose listing contained the entry.
        dir_url: String,
        /// The raw entry name.
        entry: String,
        /// The underlying URL parse error.
        #[source]
        source: url::ParseError,
    },

    /// A local directory or file operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_fetch_error_display() {
        let error = MirrorError::ListingFetch {
            url: "https://example.org/data/".to_string(),
            source: FetchError::http_status("https://example.org/data/", 503),
        };
        let msg = error.to_string();
        assert!(msg.contains("https://example.org/data/"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_invalid_entry_error_display() {
        let error = MirrorError::InvalidEntry {
            dir_url: "https://example.org/data/".to_string(),
            entry: "http://".to_string(),
            source: url::ParseError::EmptyHost,
        };
        let msg = error.to_string();
        assert!(msg.contains("https://example.org/data/"));
        assert!(msg.contains("http://"));
    }
}
