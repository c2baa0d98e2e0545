//! Registration pipeline.
//!
//! - `core`: Registrar struct, construction, group management and queries
//! - `pipeline`: `submit` and the testable "*_once" steps it sequences
//! - `recovery`: rebuilding accumulators from the ledger or a snapshot
//! - `tests`: unit tests for the above

pub mod core;
pub mod pipeline;
pub mod recovery;

pub use self::core::Registrar;

#[cfg(test)]
mod tests;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix timestamp in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
