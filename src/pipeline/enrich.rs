//! Detail enrichment: fetch raw attributes, normalize, derive metrics.

use crate::error::{AppError, Result};
use crate::models::{DetailField, ListingDetails, ListingIdentity, RawDetails};
use crate::pipeline::retry::RetryPolicy;
use crate::services::DetailSource;
use crate::utils::{normalize_whitespace, parse_number};

/// Normalize raw attribute text. Unparseable numbers count as absent.
pub fn parse_details(raw: &RawDetails) -> ListingDetails {
    let number = |field: DetailField| raw.get(&field).and_then(|text| parse_number(text));

    ListingDetails {
        price: number(DetailField::Price),
        bedrooms: number(DetailField::Bedrooms),
        service_costs: number(DetailField::ServiceCosts),
        included_services: raw
            .get(&DetailField::IncludedServices)
            .map(|text| normalize_whitespace(text))
            .filter(|text| !text.is_empty()),
        surface_area: number(DetailField::SurfaceArea),
        ..ListingDetails::default()
    }
}

/// Compute derived metrics. A metric whose inputs are missing or whose
/// divisor is not positive is left out, never zeroed.
pub fn enrich_details(mut details: ListingDetails) -> ListingDetails {
    details.price_per_bedroom = match (details.price, details.bedrooms) {
        (Some(price), Some(bedrooms)) if bedrooms > 0.0 => {
            Some((price + details.service_costs.unwrap_or(0.0)) / bedrooms)
        }
        _ => None,
    };

    details.price_per_m2 = match (details.price, details.surface_area) {
        (Some(price), Some(area)) if area > 0.0 => Some(price / area),
        _ => None,
    };

    details
}

/// Fetches and enriches details for one listing at a time.
pub struct Enricher<'a> {
    source: &'a dyn DetailSource,
    retry: RetryPolicy,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn DetailSource, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetch raw attributes (retrying transient errors) and derive metrics.
    pub async fn fetch(&self, identity: &ListingIdentity) -> Result<ListingDetails> {
        let source = self.source;
        let raw = self
            .retry
            .run("Detail fetch", move || source.fetch_raw(identity))
            .await
            .map_err(|e| match e {
                AppError::Enrichment { .. } => e,
                other => AppError::enrichment(identity.as_str(), other),
            })?;

        Ok(enrich_details(parse_details(&raw)))
    }
}
