//! Retry classification and backoff for fetch attempts.
//!
//! The fetcher owns the whole retry loop: callers hand it a retry limit
//! and never retry on top. A failed attempt is classified into a
//! [`FailureType`]; transient failures are retried with exponential
//! backoff plus jitter until the attempt budget runs out, permanent
//! failures end the loop immediately.

use std::time::Duration;

use rand::Rng;

use super::FetchError;

/// Base delay for the first retry.
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Maximum delay cap.
const MAX_DELAY: Duration = Duration::from_secs(32);

/// Multiplier applied each attempt.
const BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to delays.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: network timeout, 5xx server errors, connection refused.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, 400 Bad Request, local disk errors.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Classifies a fetch error for retry purposes.
///
/// Server-side trouble (5xx, 429) and network-level failures are
/// transient; client errors and local IO failures are permanent.
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Timeout { .. } | FetchError::Network { .. } => FailureType::Transient,
        FetchError::HttpStatus { status, .. } => {
            if *status >= 500 || *status == 429 {
                FailureType::Transient
            } else {
                FailureType::Permanent
            }
        }
        FetchError::Io { .. } => FailureType::Permanent,
    }
}

/// Bounded retry budget with exponential backoff.
///
/// Delay calculation:
///
/// ```text
/// delay = min(base * multiplier^(attempt - 1), max) + jitter
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one.
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing up to `max_attempts` attempts (minimum 1).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether a failed attempt should be retried.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) reached", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: backoff_delay(attempt),
        }
    }
}

/// Exponential backoff with jitter for a failed attempt (1-indexed).
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let factor = BACKOFF_MULTIPLIER.powi(exponent.try_into().unwrap_or(i32::MAX));
    let base = BASE_DELAY.mul_f32(factor).min(MAX_DELAY);

    let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
    base + Duration::from_millis(jitter_ms)
}
