// src/services/snapshot.rs

//! Overview page scraper.
//!
//! Fetches the search result page and collects the listing links in page
//! order.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ListingIdentity, SearchQuery, SelectorConfig};
use crate::services::SnapshotSource;
use crate::utils::{http, parse_selector, resolve_url};

/// Snapshot source backed by a plain HTTP fetch.
pub struct HttpSnapshotSource {
    client: Client,
    link_selector: Selector,
    link_attr: String,
}

impl HttpSnapshotSource {
    /// Create a source using an injected client.
    pub fn new(client: Client, selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            client,
            link_selector: parse_selector(&selectors.listing_link)?,
            link_attr: selectors.link_attr.clone(),
        })
    }

    /// Collect unique absolute listing links, first occurrence wins.
    fn extract_links(&self, html: &str, base: &Url) -> Vec<ListingIdentity> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();

        document
            .select(&self.link_selector)
            .filter_map(|anchor| anchor.value().attr(&self.link_attr))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| resolve_url(base, href))
            .filter(|link| seen.insert(link.clone()))
            .map(ListingIdentity::from)
            .collect()
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<ListingIdentity>> {
        let url = query.to_url();
        let base = Url::parse(&url).map_err(|e| AppError::snapshot(format!("{url}: {e}")))?;

        log::info!("Fetching overview {}", url);
        let html = http::fetch_text(&self.client, &url)
            .await
            .map_err(|e| AppError::snapshot(format!("{url}: {e}")))?;

        let links = self.extract_links(&html, &base);
        log::info!("Found {} listings on overview", links.len());
        Ok(links)
    }
}
