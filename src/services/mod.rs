//! External collaborators of the pipeline.
//!
//! The pipeline only sees the three traits below; the HTTP adapters are the
//! default implementations:
//! - Overview scraping (`HttpSnapshotSource`)
//! - Listing page scraping (`HttpDetailSource`)
//! - Telegram delivery (`TelegramSink`)

mod details;
mod snapshot;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ListingIdentity, RawDetails, SearchQuery};

pub use details::{DetailSelectors, HttpDetailSource};
pub use snapshot::HttpSnapshotSource;
pub use telegram::TelegramSink;

/// Supplies every listing currently visible for a query.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Listing identities in the site's own order.
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<ListingIdentity>>;
}

/// Supplies raw attribute text for one listing.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_raw(&self, identity: &ListingIdentity) -> Result<RawDetails>;
}

/// Delivers a finished message to an external channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<()>;
}
