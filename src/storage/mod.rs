//! Ledger abstractions for the durable known-set.
//!
//! The ledger is append-only: the pipeline reads every identity of its
//! partition once per cycle and appends one entry per newly processed
//! listing. Nothing is ever updated or deleted.
//!
//! ## File Layout
//!
//! ```text
//! storage/
//! ├── config.toml           # Watcher configuration
//! └── ledger.jsonl          # One KnownEntry per line
//! ```

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{KnownEntry, ListingIdentity};

// Re-export for convenience
pub use local::FileLedger;

/// Outcome of a successful `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The entry was appended.
    Inserted,
    /// The partition already held this identity; nothing was written.
    AlreadyExists,
}

/// Trait for ledger backends.
///
/// Errors from either method are reported as `AppError::LedgerUnavailable`.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every identity previously recorded in `partition`.
    async fn query_known(&self, partition: &str) -> Result<HashSet<ListingIdentity>>;

    /// Append one entry. A duplicate is `AlreadyExists`, never an error.
    async fn record(&self, entry: &KnownEntry) -> Result<RecordOutcome>;
}
