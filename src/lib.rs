// src/lib.rs

//! Listing watcher library.
//!
//! Polls a rental listing site, diffs the visible listings against a durable
//! ledger of already-seen ones, and sends one notification per new listing.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
