//! indexsync core library
//!
//! Mirrors a remote, HTTP-exposed directory tree (server-generated index
//! pages) onto local storage, downloading every file exactly once and
//! resuming safely after interruption.
//!
//! # Architecture
//!
//! - [`db`] - SQLite connection and schema management
//! - [`ledger`] - persistent per-URL download records and fetch log
//! - [`fetch`] - HTTP fetch primitive with bounded internal retry
//! - [`listing`] - index-page parsing into file and directory names
//! - [`batch`] - barrier batching for bounded-concurrency execution
//! - [`mirror`] - breadth-first traversal engine
//! - [`config`] - run configuration and URL-to-path mapping

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod db;
pub mod fetch;
pub mod ledger;
pub mod listing;
pub mod mirror;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use db::Database;
pub use fetch::{FetchError, FetchReport, Fetcher};
pub use ledger::{Ledger, LedgerError, RecordState};
pub use listing::{Listing, ListingError};
pub use mirror::{MirrorEngine, MirrorError, MirrorStats};
