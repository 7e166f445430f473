// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;
use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The snapshot could not be acquired, or came back empty.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The ledger could not be read or written.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Details for one listing could not be fetched.
    #[error("Enrichment failed for {identity}: {message}")]
    Enrichment { identity: String, message: String },

    /// The notification sink rejected or failed a delivery.
    #[error("Notify failed: {message}")]
    Notify { message: String, transient: bool },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a snapshot error.
    pub fn snapshot(message: impl fmt::Display) -> Self {
        Self::Snapshot(message.to_string())
    }

    /// Create a ledger error.
    pub fn ledger(message: impl fmt::Display) -> Self {
        Self::LedgerUnavailable(message.to_string())
    }

    /// Create an enrichment error for one listing.
    pub fn enrichment(identity: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Enrichment {
            identity: identity.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display, transient: bool) -> Self {
        Self::Notify {
            message: message.to_string(),
            transient,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    return true;
                }
                e.status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Self::Io(e) => matches!(
                e.kind(),
                ErrorKind::TimedOut
                    | ErrorKind::Interrupted
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::WouldBlock
            ),
            Self::Notify { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Whether this error must abort the whole cycle.
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(self, Self::Snapshot(_) | Self::LedgerUnavailable(_))
    }
}
