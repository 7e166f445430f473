//! Listing identity, ledger entries, and per-listing details.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Canonical URL of one listing.
///
/// Equality is exact string match; normalization is the snapshot source's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingIdentity(String);

impl ListingIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable fixed-width key for table-style ledgers.
    pub fn row_key(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for ListingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ListingIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ListingIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ListingIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One row of the ledger. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntry {
    /// Logical namespace, one per source site
    pub partition: String,

    /// Hex SHA-256 of the identity
    pub row_key: String,

    /// The listing itself
    pub identity: ListingIdentity,

    /// Timestamp of the cycle that first saw the listing
    pub first_seen_at: DateTime<Utc>,
}

impl KnownEntry {
    pub fn new(
        identity: ListingIdentity,
        first_seen_at: DateTime<Utc>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            row_key: identity.row_key(),
            identity,
            first_seen_at,
        }
    }
}

/// Attributes a detail source can report for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    Price,
    Bedrooms,
    ServiceCosts,
    IncludedServices,
    SurfaceArea,
}

impl DetailField {
    /// Label used in notification messages.
    pub fn label(&self) -> &'static str {
        match self {
            DetailField::Price => "price",
            DetailField::Bedrooms => "bedrooms",
            DetailField::ServiceCosts => "service costs",
            DetailField::IncludedServices => "rental price services",
            DetailField::SurfaceArea => "surface area",
        }
    }
}

/// Raw attribute text exactly as extracted from the listing page.
///
/// A missing key means the page did not carry that attribute.
pub type RawDetails = BTreeMap<DetailField, String>;

/// Normalized attributes of one listing plus derived metrics.
///
/// Lives only for the duration of one item in the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub price: Option<f64>,
    pub bedrooms: Option<f64>,
    pub service_costs: Option<f64>,
    pub included_services: Option<String>,
    pub surface_area: Option<f64>,
    pub price_per_bedroom: Option<f64>,
    pub price_per_m2: Option<f64>,
}

impl ListingDetails {
    /// Present fields as `(label, value)` pairs, in message order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let numbers = [
            (DetailField::Price.label(), self.price),
            (DetailField::Bedrooms.label(), self.bedrooms),
            (DetailField::ServiceCosts.label(), self.service_costs),
        ];

        let mut out: Vec<(&'static str, String)> = numbers
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label, format_number(v))))
            .collect();

        if let Some(text) = self.included_services.as_deref().filter(|t| !t.is_empty()) {
            out.push((DetailField::IncludedServices.label(), text.to_string()));
        }
        if let Some(v) = self.surface_area {
            out.push((DetailField::SurfaceArea.label(), format_number(v)));
        }
        if let Some(v) = self.price_per_bedroom {
            out.push(("price per bedroom", format_number(v)));
        }
        if let Some(v) = self.price_per_m2 {
            out.push(("price per m2", format_number(v)));
        }
        out
    }
}

/// Whole numbers print without decimals, everything else with two.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
