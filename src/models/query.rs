//! Search query composed into the listing site's path scheme.

use serde::{Deserialize, Serialize};

/// Search parameters for the snapshot.
///
/// Each set parameter adds one path segment, e.g.
/// `/apartments/haarlem/1-bedrooms/0-1500/radius-10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Listing overview root, e.g. `https://www.pararius.com/apartments`
    pub base_url: String,

    /// City slug; empty for nationwide
    pub city: String,

    pub minimum_bedrooms: Option<u32>,

    /// Price ceiling in euros; 0 disables the filter
    pub max_price_eur: u32,

    pub km_radius: Option<u32>,
}

impl SearchQuery {
    /// Build the overview URL for this query.
    pub fn to_url(&self) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();

        let city = self.city.trim().to_lowercase();
        if !city.is_empty() {
            url.push('/');
            url.push_str(&city);
        }
        if let Some(bedrooms) = self.minimum_bedrooms {
            url.push_str(&format!("/{bedrooms}-bedrooms"));
        }
        if self.max_price_eur > 0 {
            url.push_str(&format!("/0-{}", self.max_price_eur));
        }
        if let Some(radius) = self.km_radius {
            url.push_str(&format!("/radius-{radius}"));
        }
        url
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            city: defaults::city(),
            minimum_bedrooms: Some(1),
            max_price_eur: 1500,
            km_radius: Some(10),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://www.pararius.com/apartments".into()
    }
    pub fn city() -> String {
        "haarlem".into()
    }
}
