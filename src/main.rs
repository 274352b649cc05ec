//! CLI entry point for the indexsync tool.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indexsync_core::{Config, Database, Ledger, MirrorEngine};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // Create the local directories up front so they can be canonicalized
    std::fs::create_dir_all(&args.save_dir)
        .with_context(|| format!("cannot create save directory {}", args.save_dir.display()))?;
    std::fs::create_dir_all(&args.state_dir)
        .with_context(|| format!("cannot create state directory {}", args.state_dir.display()))?;

    let save_dir = std::fs::canonicalize(&args.save_dir)?;
    let state_dir = std::fs::canonicalize(&args.state_dir)?;

    let config = Arc::new(Config::new(
        &args.url,
        save_dir,
        state_dir,
        args.retry_limit,
        args.timeout,
        usize::from(args.concurrency),
    )?);

    std::fs::create_dir_all(config.listing_cache_dir()).with_context(|| {
        format!(
            "cannot create listing cache directory {}",
            config.listing_cache_dir().display()
        )
    })?;

    info!(
        root = %config.root_url(),
        save_dir = %config.save_dir().display(),
        state_dir = %config.state_dir().display(),
        retry_limit = config.retry_limit(),
        timeout_secs = config.timeout().as_secs(),
        concurrency = config.concurrency(),
        "indexsync starting"
    );

    let db = Database::new(&config.ledger_path()).await?;
    let ledger = Ledger::new(db);

    let engine = MirrorEngine::new(Arc::clone(&config), ledger);
    let stats = engine.run().await?;

    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        dirs = stats.dirs_visited(),
        "mirror complete"
    );

    Ok(())
}
