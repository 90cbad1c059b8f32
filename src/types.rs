use serde::Deserialize;
use std::fmt;

use crate::error::QuoteError;

/// Canonical Mercado Livre listing identifier: an uppercase marketplace prefix
/// followed by digits (e.g., `MLB1234567891`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingId(String);

impl ListingId {
    /// Built by the normalizer once the canonical shape holds.
    pub(crate) fn new(canonical: String) -> Self {
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalized sender postal code: non-empty, digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZipCode(String);

impl ZipCode {
    /// Built by the normalizer after stripping punctuation.
    pub(crate) fn new(digits: String) -> Self {
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZipCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One normalized (listing, ZIP) pair ready to fetch.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub listing_id: ListingId,
    pub zip_code: ZipCode,
}

/// Response payload of `GET /items/{id}/shipping_options`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingOptionsResponse {
    #[serde(default)]
    pub destination: Option<Destination>,
    #[serde(default)]
    pub options: Vec<ShippingOption>,
}

impl ShippingOptionsResponse {
    /// Shipping option at the given payload position, if the API returned
    /// enough of them.
    pub fn option_at(&self, index: usize) -> Option<&ShippingOption> {
        self.options.get(index)
    }
}

/// Destination the API resolved from the `zip_code` query parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Destination {
    pub zip_code: Option<String>,
    pub city: Option<PlaceName>,
    pub state: Option<PlaceName>,
    pub country: Option<PlaceName>,
}

/// Named place reference used throughout the destination block.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceName {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Destination {
    /// Human label for the resolved destination, when the API echoes one.
    pub fn label(&self) -> Option<String> {
        let city = self
            .city
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .filter(|s| !s.is_empty());
        let state = self
            .state
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .filter(|s| !s.is_empty());

        match (city, state) {
            (Some(c), Some(s)) => Some(format!("{}, {}", c, s)),
            (Some(c), None) => Some(c.to_string()),
            (None, Some(s)) => Some(s.to_string()),
            (None, None) => self.zip_code.clone(),
        }
    }
}

/// One shipping method entry of the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingOption {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub currency_id: Option<String>,
    pub shipping_method_id: Option<u64>,
    pub shipping_method_type: Option<String>,
    pub display: Option<String>,
    /// Cost charged for the shipment before discounts; the figure this tool reports.
    pub list_cost: Option<f64>,
    /// Cost after discounts (0 on free-shipping listings).
    pub cost: Option<f64>,
    #[serde(default)]
    pub estimated_delivery_time: Option<EstimatedDeliveryTime>,
}

impl ShippingOption {
    /// Extract the reported quote from this option, if it carries a cost.
    pub fn quote(&self) -> Option<ShippingQuote> {
        let cost = self.list_cost?;
        Some(ShippingQuote {
            cost,
            currency_id: self.currency_id.clone(),
            option_name: self.name.clone(),
        })
    }
}

/// Delivery estimate attached to a shipping option.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatedDeliveryTime {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
    pub unit: Option<String>,
    pub shipping: Option<u32>,
    pub handling: Option<u32>,
}

/// Extracted success value for one listing. Created per request, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingQuote {
    pub cost: f64,
    pub currency_id: Option<String>,
    pub option_name: Option<String>,
}

/// Per-item outcome delivered in input order by the batch fetcher.
#[derive(Debug)]
pub struct QuoteResult {
    pub listing_id: ListingId,
    pub outcome: Result<ShippingQuote, QuoteError>,
}

/// One line of user input after normalization.
#[derive(Debug)]
pub struct InputLine {
    /// The raw piece as the user typed it (trimmed).
    pub raw: String,
    /// Validated request, or why the line was rejected.
    pub parsed: Result<QuoteRequest, QuoteError>,
}

/// Ordered batch built once from free-form user input. Order is significant
/// and preserved through to results.
#[derive(Debug)]
pub struct BatchInput {
    pub zip_code: ZipCode,
    pub lines: Vec<InputLine>,
}

impl BatchInput {
    /// Requests for the lines that validated, in input order.
    pub fn valid_requests(&self) -> Vec<QuoteRequest> {
        self.lines
            .iter()
            .filter_map(|line| line.parsed.as_ref().ok().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Full-pipeline outcome for one input line. Invalid lines surface their
/// validation error here without an HTTP call ever being made.
#[derive(Debug)]
pub struct LineQuote {
    /// The raw piece as the user typed it.
    pub raw: String,
    /// Canonical id when the line validated.
    pub listing_id: Option<ListingId>,
    pub outcome: Result<ShippingQuote, QuoteError>,
}

impl LineQuote {
    /// Label to render next to the outcome: the canonical id when the line
    /// validated, the raw input otherwise.
    pub fn label(&self) -> &str {
        self.listing_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "coverage_type": "zipcode",
        "item_id": "MLB1234567891",
        "destination": {
            "zip_code": "01001000",
            "city": { "id": "BR-SP-44", "name": "São Paulo" },
            "state": { "id": "BR-SP", "name": "São Paulo" },
            "country": { "id": "BR", "name": "Brasil" },
            "neighborhood": { "id": null, "name": null }
        },
        "options": [
            {
                "id": 2133344532,
                "name": "Normal",
                "currency_id": "BRL",
                "shipping_method_id": 100009,
                "shipping_method_type": "standard",
                "display": "option",
                "cost": 0,
                "list_cost": 45.9,
                "estimated_delivery_time": {
                    "type": "known",
                    "date": "2026-09-01T00:00:00.000-03:00",
                    "unit": "hour",
                    "shipping": 96,
                    "handling": 24
                }
            },
            {
                "id": 2133344533,
                "name": "Expresso",
                "currency_id": "BRL",
                "shipping_method_id": 100010,
                "shipping_method_type": "next_day",
                "display": "recommended",
                "cost": 52.9,
                "list_cost": 52.9
            },
            {
                "id": 2133344534,
                "name": "Mercado Envios",
                "currency_id": "BRL",
                "cost": 0,
                "list_cost": 39.9
            }
        ]
    }"#;

    #[test]
    fn test_decode_full_payload() {
        let payload: ShippingOptionsResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(payload.options.len(), 3);

        let destination = payload.destination.as_ref().unwrap();
        assert_eq!(destination.zip_code.as_deref(), Some("01001000"));
        assert_eq!(destination.label().as_deref(), Some("São Paulo, São Paulo"));

        let first = &payload.options[0];
        assert_eq!(first.name.as_deref(), Some("Normal"));
        assert_eq!(first.cost, Some(0.0));
        let eta = first.estimated_delivery_time.as_ref().unwrap();
        assert_eq!(eta.kind.as_deref(), Some("known"));
        assert_eq!(eta.shipping, Some(96));
    }

    #[test]
    fn test_option_at_extracts_third_slot() {
        let payload: ShippingOptionsResponse = serde_json::from_str(SAMPLE).unwrap();
        let option = payload.option_at(2).unwrap();
        assert_eq!(option.list_cost, Some(39.9));

        let quote = option.quote().unwrap();
        assert_eq!(quote.cost, 39.9);
        assert_eq!(quote.currency_id.as_deref(), Some("BRL"));
        assert_eq!(quote.option_name.as_deref(), Some("Mercado Envios"));

        assert!(payload.option_at(3).is_none());
    }

    #[test]
    fn test_decode_tolerates_missing_options() {
        let payload: ShippingOptionsResponse =
            serde_json::from_str(r#"{"destination": null}"#).unwrap();
        assert!(payload.options.is_empty());
        assert!(payload.option_at(0).is_none());
        assert!(payload.destination.is_none());
    }

    #[test]
    fn test_quote_requires_list_cost() {
        let option: ShippingOption =
            serde_json::from_str(r#"{"name": "Normal", "cost": 12.5}"#).unwrap();
        assert!(option.quote().is_none());
    }

    #[test]
    fn test_destination_label_fallbacks() {
        let city_only: Destination =
            serde_json::from_str(r#"{"city": {"name": "Curitiba"}}"#).unwrap();
        assert_eq!(city_only.label().as_deref(), Some("Curitiba"));

        let zip_only: Destination = serde_json::from_str(r#"{"zip_code": "80010000"}"#).unwrap();
        assert_eq!(zip_only.label().as_deref(), Some("80010000"));

        let empty: Destination = serde_json::from_str("{}").unwrap();
        assert!(empty.label().is_none());
    }
}
