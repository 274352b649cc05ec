//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use indexsync_core::config::{
    DEFAULT_CONCURRENCY, DEFAULT_RETRY_LIMIT, DEFAULT_ROOT_URL, DEFAULT_TIMEOUT_SECS,
};

/// Mirror an HTTP-exposed directory tree onto local storage.
///
/// indexsync walks the server-generated index pages of a remote tree,
/// downloads every file exactly once, and resumes safely after
/// interruption using a persistent ledger.
#[derive(Parser, Debug)]
#[command(name = "indexsync")]
#[command(author, version, about)]
pub struct Args {
    /// Root URL of the remote index tree (trailing slash added if missing)
    #[arg(long, default_value = DEFAULT_ROOT_URL)]
    pub url: String,

    /// Directory to mirror the remote tree into
    #[arg(long, default_value = ".")]
    pub save_dir: PathBuf,

    /// Directory for the ledger database and cached listing pages
    #[arg(long, default_value = "./logs")]
    pub state_dir: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Retry attempts per fetch (1-100)
    #[arg(long, default_value_t = DEFAULT_RETRY_LIMIT, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub retry_limit: u32,

    /// Per-attempt fetch timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Maximum concurrent jobs per batch (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["indexsync"]).unwrap();
        assert_eq!(args.url, DEFAULT_ROOT_URL);
        assert_eq!(args.save_dir, PathBuf::from("."));
        assert_eq!(args.state_dir, PathBuf::from("./logs"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.retry_limit, 30);
        assert_eq!(args.timeout, 100);
        assert_eq!(args.concurrency, 16);
    }

    #[test]
    fn test_cli_url_flag() {
        let args =
            Args::try_parse_from(["indexsync", "--url", "https://example.org/data/"]).unwrap();
        assert_eq!(args.url, "https://example.org/data/");
    }

    #[test]
    fn test_cli_dirs_flags() {
        let args = Args::try_parse_from([
            "indexsync",
            "--save-dir",
            "/out",
            "--state-dir",
            "/state",
        ])
        .unwrap();
        assert_eq!(args.save_dir, PathBuf::from("/out"));
        assert_eq!(args.state_dir, PathBuf::from("/state"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["indexsync", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["indexsync", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["indexsync", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_retry_limit_range() {
        let args = Args::try_parse_from(["indexsync", "--retry-limit", "5"]).unwrap();
        assert_eq!(args.retry_limit, 5);

        let result = Args::try_parse_from(["indexsync", "--retry-limit", "0"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["indexsync", "--retry-limit", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_timeout_flag() {
        let args = Args::try_parse_from(["indexsync", "--timeout", "10"]).unwrap();
        assert_eq!(args.timeout, 10);

        let result = Args::try_parse_from(["indexsync", "--timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_concurrency_range() {
        let args = Args::try_parse_from(["indexsync", "-c", "1"]).unwrap();
        assert_eq!(args.concurrency, 1);

        let args = Args::try_parse_from(["indexsync", "--concurrency", "100"]).unwrap();
        assert_eq!(args.concurrency, 100);

        let result = Args::try_parse_from(["indexsync", "-c", "0"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["indexsync", "-c", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["indexsync", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["indexsync", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
