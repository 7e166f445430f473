// src/services/details.rs

//! Listing page scraper.
//!
//! Each attribute is extracted independently; a selector that matches
//! nothing simply leaves that attribute out.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{DetailField, ListingIdentity, RawDetails, SelectorConfig};
use crate::services::DetailSource;
use crate::utils::{http, normalize_whitespace, parse_selector};

/// Parsed selectors for the listing page.
pub struct DetailSelectors {
    price: Selector,
    price_postfix: Selector,
    fields: Vec<(DetailField, Selector)>,
}

impl DetailSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            price: parse_selector(&config.price)?,
            price_postfix: parse_selector(&config.price_postfix)?,
            fields: vec![
                (DetailField::Bedrooms, parse_selector(&config.bedrooms)?),
                (DetailField::ServiceCosts, parse_selector(&config.service_costs)?),
                (
                    DetailField::IncludedServices,
                    parse_selector(&config.included_services)?,
                ),
                (DetailField::SurfaceArea, parse_selector(&config.surface_area)?),
            ],
        })
    }

    /// Extract raw attribute text from a listing page.
    pub fn extract(&self, html: &str) -> RawDetails {
        let document = Html::parse_document(html);
        let mut raw = RawDetails::new();

        if let Some(price) = document.select(&self.price).next() {
            let mut text = element_text(&price);
            if let Some(postfix) = document.select(&self.price_postfix).next() {
                let postfix = element_text(&postfix);
                if !postfix.is_empty() {
                    text = normalize_whitespace(&text.replace(&postfix, ""));
                }
            }
            if !text.is_empty() {
                raw.insert(DetailField::Price, text);
            }
        }

        for (field, selector) in &self.fields {
            if let Some(element) = document.select(selector).next() {
                let text = element_text(&element);
                if !text.is_empty() {
                    raw.insert(*field, text);
                }
            }
        }
        raw
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Detail source backed by a plain HTTP fetch.
pub struct HttpDetailSource {
    client: Client,
    selectors: DetailSelectors,
}

impl HttpDetailSource {
    /// Create a source using an injected client.
    pub fn new(client: Client, selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            client,
            selectors: DetailSelectors::from_config(selectors)?,
        })
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch_raw(&self, identity: &ListingIdentity) -> Result<RawDetails> {
        // HTTP errors pass through untouched so the retry layer can classify them
        let html = http::fetch_text(&self.client, identity.as_str()).await?;

        let raw = self.selectors.extract(&html);
        log::debug!("Extracted {} fields from {}", raw.len(), identity);
        Ok(raw)
    }
}
