//! HTTP fetch primitive with bounded internal retry.
//!
//! The [`Fetcher`] retrieves a URL into a destination file, streaming the
//! body to disk. It performs its own retry loop up to a configured limit
//! and enforces a hard wall-clock timeout per attempt; callers never
//! retry on top of it. Failures are typed ([`FetchError`]) rather than
//! opaque exit codes.

mod client;
mod error;
mod retry;

pub use client::{FetchReport, Fetcher};
pub use error::FetchError;
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
