//! Utility functions and helpers.

pub mod http;
pub mod log;

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;
use url::Url;

use crate::error::{AppError, Result};

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Parse a CSS selector, mapping failures to `AppError::Selector`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("static regex"))
}

/// Extract the first number from free text like `€1,500 per month` or `75 m²`.
///
/// Separators followed by exactly three digits are thousands separators;
/// any other separator is the decimal point.
pub fn parse_number(text: &str) -> Option<f64> {
    let raw = number_pattern().find(text)?.as_str();

    let mut groups = raw.split(['.', ',']);
    let mut normalized = groups.next()?.to_string();
    let mut seen_decimal = false;
    for group in groups {
        if seen_decimal {
            return None;
        }
        if group.len() != 3 {
            seen_decimal = true;
            normalized.push('.');
        }
        normalized.push_str(group);
    }
    normalized.parse().ok()
}
