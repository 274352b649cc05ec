//! Breadth-first mirroring of a remote HTTP index tree.
//!
//! [`MirrorEngine`] walks the remote tree round by round, decides per
//! file whether the local copy already satisfies it (via the ledger), and
//! coordinates bounded-concurrency fetches. See the engine docs for the
//! traversal and error-policy details.

mod engine;
mod error;

pub use engine::{MirrorEngine, MirrorStats};
pub use error::MirrorError;
