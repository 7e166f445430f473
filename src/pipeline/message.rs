//! Notification text for one listing.

use crate::models::{ListingDetails, ListingIdentity};

/// Replace underscores, which the sink's Markdown dialect treats as markup.
pub fn sanitize(text: &str) -> String {
    text.replace('_', " ")
}

/// One `label - value` line per present field, then the link.
///
/// `details` is `None` when only the link is known.
pub fn build_message(identity: &ListingIdentity, details: Option<&ListingDetails>) -> String {
    let mut lines: Vec<String> = details
        .map(|d| {
            d.fields()
                .into_iter()
                .map(|(label, value)| format!("{label} - {value}"))
                .collect()
        })
        .unwrap_or_default();

    lines.push(identity.to_string());
    sanitize(&lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::enrich::enrich_details;

    #[test]
    fn test_message_lists_present_fields_then_link() {
        let details = enrich_details(ListingDetails {
            price: Some(1500.0),
            bedrooms: Some(2.0),
            service_costs: Some(50.0),
            surface_area: Some(75.0),
            ..ListingDetails::default()
        });
        let identity = ListingIdentity::new("https://www.pararius.com/apartment-for-rent/haarlem/a1/kerkstraat");

        let message = build_message(&identity, Some(&details));
        assert_eq!(
            message,
            "price - 1500\n\
             bedrooms - 2\n\
             service costs - 50\n\
             surface area - 75\n\
             price per bedroom - 775\n\
             price per m2 - 20\n\
             https://www.pararius.com/apartment-for-rent/haarlem/a1/kerkstraat"
        );
    }

    #[test]
    fn test_link_only_message() {
        let identity = ListingIdentity::new("https://example.com/x");
        assert_eq!(build_message(&identity, None), "https://example.com/x");
        assert_eq!(
            build_message(&identity, Some(&ListingDetails::default())),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_no_underscores_survive() {
        let identity = ListingIdentity::new("https://example.com/room_for_rent");
        let details = ListingDetails {
            included_services: Some("gas_water".into()),
            ..ListingDetails::default()
        };
        let message = build_message(&identity, Some(&details));
        assert!(!message.contains('_'));
        assert!(message.ends_with("https://example.com/room for rent"));
    }
}
