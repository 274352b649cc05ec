//! Run configuration and URL-to-path mapping.
//!
//! The configuration is constructed once in `main` from CLI arguments and
//! passed by reference (or `Arc`) into every component. There are no
//! process-wide mutable globals; everything a component needs to know about
//! the run lives here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default root URL to mirror (NOAA IGRA public archive).
pub const DEFAULT_ROOT_URL: &str = "https://www.ncei.noaa.gov/pub/data/igra/";

/// Default retry limit per fetch.
pub const DEFAULT_RETRY_LIMIT: u32 = 30;

/// Default per-attempt fetch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

/// Default number of concurrent jobs per batch.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// File name of the SQLite ledger inside the state directory.
const LEDGER_FILE_NAME: &str = "indexsync.db";

/// Subdirectory of the state directory holding cached listing pages.
const LISTING_CACHE_DIR: &str = "html";

/// Configuration errors raised while validating CLI input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The root URL could not be parsed or uses an unsupported scheme.
    #[error("invalid root URL {url}: {reason}")]
    InvalidRootUrl {
        /// The offending URL string.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A remote URL does not live under the configured root.
    #[error("URL {url} is outside the mirrored root {root}")]
    OutsideRoot {
        /// The offending URL.
        url: String,
        /// The configured root URL.
        root: String,
    },
}

/// Immutable configuration for one mirroring run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the remote tree; always ends with a slash.
    root_url: Url,
    /// Directory the remote tree is mirrored into.
    save_dir: PathBuf,
    /// Directory holding the ledger database and listing cache.
    state_dir: PathBuf,
    /// Retry attempts per fetch, applied inside the fetcher.
    retry_limit: u32,
    /// Hard wall-clock bound per fetch attempt.
    timeout: Duration,
    /// Concurrent jobs per batch.
    concurrency: usize,
}

impl Config {
    /// Builds a validated configuration.
    ///
    /// The root URL gains a trailing slash if it lacks one, so that
    /// relative listing entries join onto it as children.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] if the root URL is not a
    /// well-formed http(s) URL with a host.
    pub fn new(
        root_url: &str,
        save_dir: PathBuf,
        state_dir: PathBuf,
        retry_limit: u32,
        timeout_secs: u64,
        concurrency: usize,
    ) -> Result<Self, ConfigError> {
        let mut raw = root_url.to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let parsed = Url::parse(&raw).map_err(|e| ConfigError::InvalidRootUrl {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::InvalidRootUrl {
                    url: root_url.to_string(),
                    reason: format!("unsupported scheme {scheme}"),
                });
            }
        }

        if parsed.host().is_none() {
            return Err(ConfigError::InvalidRootUrl {
                url: root_url.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self {
            root_url: parsed,
            save_dir,
            state_dir,
            retry_limit,
            timeout: Duration::from_secs(timeout_secs),
            concurrency,
        })
    }

    /// Root URL of the mirrored tree (trailing slash guaranteed).
    #[must_use]
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// Directory the remote tree is mirrored into.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Directory holding the ledger database and listing cache.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Retry attempts per fetch.
    #[must_use]
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Hard wall-clock bound per fetch attempt.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Concurrent jobs per batch.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Path of the SQLite ledger database.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE_NAME)
    }

    /// Directory where fetched listing pages are cached.
    #[must_use]
    pub fn listing_cache_dir(&self) -> PathBuf {
        self.state_dir.join(LISTING_CACHE_DIR)
    }

    /// Cache file for one directory's listing page.
    ///
    /// The name is a URL-safe, reversible encoding of the directory URL,
    /// so re-runs reuse (overwrite) the same cache file.
    #[must_use]
    pub fn listing_cache_path(&self, dir_url: &Url) -> PathBuf {
        let encoded = urlencoding::encode(dir_url.as_str());
        self.listing_cache_dir().join(format!("{encoded}.html"))
    }

    /// Maps a remote URL under the root onto its local save path.
    ///
    /// The remote path hierarchy relative to the root is mirrored below
    /// the save directory: with root `https://example.org/data/` and save
    /// directory `/out`, `https://example.org/data/2020/a.txt` maps to
    /// `/out/2020/a.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutsideRoot`] if the URL does not start
    /// with the root URL.
    pub fn save_path(&self, url: &Url) -> Result<PathBuf, ConfigError> {
        let root = self.root_url.as_str();
        let full = url.as_str();

        let relative = full
            .strip_prefix(root)
            .ok_or_else(|| ConfigError::OutsideRoot {
                url: full.to_string(),
                root: root.to_string(),
            })?;

        let mut path = self.save_dir.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_for(root: &str) -> Config {
        Config::new(
            root,
            PathBuf::from("/out"),
            PathBuf::from("/state"),
            DEFAULT_RETRY_LIMIT,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_CONCURRENCY,
        )
        .unwrap()
    }

    #[test]
    fn test_config_enforces_trailing_slash() {
        let config = config_for("https://example.org/data");
        assert_eq!(config.root_url().as_str(), "https://example.org/data/");
    }

    #[test]
    fn test_config_keeps_existing_trailing_slash() {
        let config = config_for("https://example.org/data/");
        assert_eq!(config.root_url().as_str(), "https://example.org/data/");
    }

    #[test]
    fn test_config_rejects_bad_scheme() {
        let result = Config::new(
            "ftp://example.org/data/",
            PathBuf::from("/out"),
            PathBuf::from("/state"),
            1,
            1,
            1,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRootUrl { .. })));
    }

    #[test]
    fn test_config_rejects_malformed_url() {
        let result = Config::new(
            "not a url",
            PathBuf::from("/out"),
            PathBuf::from("/state"),
            1,
            1,
            1,
        );
        assert!(matches!(result, Err(ConfigError::InvalidRootUrl { .. })));
    }

    #[test]
    fn test_save_path_maps_file_under_root() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/data/2020/a.txt").unwrap();
        assert_eq!(
            config.save_path(&url).unwrap(),
            PathBuf::from("/out/2020/a.txt")
        );
    }

    #[test]
    fn test_save_path_maps_root_to_save_dir() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/data/").unwrap();
        assert_eq!(config.save_path(&url).unwrap(), PathBuf::from("/out"));
    }

    #[test]
    fn test_save_path_maps_directory_url() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/data/2020/").unwrap();
        assert_eq!(config.save_path(&url).unwrap(), PathBuf::from("/out/2020"));
    }

    #[test]
    fn test_save_path_rejects_url_outside_root() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/other/a.txt").unwrap();
        assert!(matches!(
            config.save_path(&url),
            Err(ConfigError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn test_listing_cache_path_is_reversible() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/data/2020/").unwrap();
        let path = config.listing_cache_path(&url);

        let name = path.file_name().unwrap().to_str().unwrap();
        let encoded = name.strip_suffix(".html").unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        assert_eq!(decoded, url.as_str());
    }

    #[test]
    fn test_listing_cache_path_is_deterministic() {
        let config = config_for("https://example.org/data/");
        let url = Url::parse("https://example.org/data/2020/").unwrap();
        assert_eq!(
            config.listing_cache_path(&url),
            config.listing_cache_path(&url)
        );
    }

    #[test]
    fn test_ledger_path_lives_in_state_dir() {
        let config = config_for("https://example.org/data/");
        assert_eq!(config.ledger_path(), PathBuf::from("/state/indexsync.db"));
        assert_eq!(config.listing_cache_dir(), PathBuf::from("/state/html"));
    }
}
