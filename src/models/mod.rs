// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod query;
mod report;

// Re-export all public types
pub use config::{
    BatchConfig, Config, ENV_BOT_TOKEN, ENV_CHAT_ID, EnrichmentFailurePolicy, HttpConfig,
    LedgerConfig, NotifyConfig, RetryConfig, ScheduleConfig, SelectorConfig,
};
pub use listing::{DetailField, KnownEntry, ListingDetails, ListingIdentity, RawDetails};
pub use query::SearchQuery;
pub use report::{CycleReport, CycleState, ProcessingReport};
