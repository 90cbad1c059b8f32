//! Batch shipping-quote client for the Mercado Livre items API.
//!
//! One [`MeliClient`] owns one HTTP connection pool; batch operations fan the
//! requests out concurrently over that pool and always deliver results in
//! input order, even though completions race.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::{StreamExt, stream};
use reqwest::{Client, header};
use tracing::{debug, warn};

use crate::error::QuoteError;
use crate::normalize::{self, DEFAULT_PREFIX};
use crate::types::{
    BatchInput, LineQuote, ListingId, QuoteRequest, QuoteResult, ShippingOptionsResponse,
    ShippingQuote, ZipCode,
};

/// Public Mercado Livre API root.
const DEFAULT_API_URL: &str = "https://api.mercadolibre.com";
/// Per-request timeout; expiry is reported as a network failure for that item.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// In-flight request cap for batch fetches.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;
/// Payload slot priced by default (the tool reports the third option).
const DEFAULT_OPTION_INDEX: usize = 2;

/// Configuration for [`MeliClient`].
#[derive(Debug, Clone)]
pub struct MeliConfig {
    /// API base URL, overridable for tests and mocks.
    pub base_url: String,
    /// Prefix prepended to bare numeric listing ids.
    pub default_prefix: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum concurrent requests per batch.
    pub max_in_flight: usize,
    /// Which shipping option of the payload to price.
    pub option_index: usize,
}

impl Default for MeliConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            default_prefix: DEFAULT_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            option_index: DEFAULT_OPTION_INDEX,
        }
    }
}

/// Shipping quote client holding the shared HTTP connection pool.
pub struct MeliClient {
    http_client: Client,
    config: MeliConfig,
}

impl MeliClient {
    pub fn new() -> Result<Self> {
        Self::with_config(MeliConfig::default())
    }

    pub fn with_config(config: MeliConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &MeliConfig {
        &self.config
    }

    /// Parse free-form id and ZIP input using this client's default prefix.
    pub fn parse_batch(&self, ids_text: &str, zip_text: &str) -> Result<BatchInput, QuoteError> {
        normalize::parse_batch(ids_text, zip_text, &self.config.default_prefix)
    }

    /// Fetch the raw shipping-options payload for one listing.
    pub async fn shipping_options(
        &self,
        listing_id: &ListingId,
        zip_code: &ZipCode,
    ) -> Result<ShippingOptionsResponse, QuoteError> {
        // Both components are canonical alphanumerics, safe to splice into the URL.
        let url = format!(
            "{}/items/{}/shipping_options?zip_code={}",
            self.config.base_url.trim_end_matches('/'),
            listing_id,
            zip_code
        );

        debug!(listing_id = %listing_id, zip_code = %zip_code, "requesting shipping options");

        let response = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(listing_id = %listing_id, %status, "shipping options request failed");
            return Err(QuoteError::api(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: ShippingOptionsResponse = serde_json::from_str(&body)?;
        Ok(payload)
    }

    /// Fetch the shipping quote for one listing.
    ///
    /// Prices the option at the configured payload position; a payload without
    /// that slot or without a cost on it is a parse failure for this item.
    pub async fn shipping_quote(
        &self,
        listing_id: &ListingId,
        zip_code: &ZipCode,
    ) -> Result<ShippingQuote, QuoteError> {
        let payload = self.shipping_options(listing_id, zip_code).await?;

        let option = payload
            .option_at(self.config.option_index)
            .ok_or_else(|| QuoteError::Parse("no shipping options available".to_string()))?;

        option
            .quote()
            .ok_or_else(|| QuoteError::Parse("shipping option has no list_cost".to_string()))
    }

    /// Fetch quotes for many listings concurrently, preserving input order.
    ///
    /// Requests are index-tagged before dispatch and gathered under the
    /// configured in-flight cap; no item's failure affects any other. Exactly
    /// one result is returned per request, in request order.
    pub async fn shipping_quotes(&self, requests: &[QuoteRequest]) -> Vec<QuoteResult> {
        debug!(count = requests.len(), "dispatching quote batch");
        let limit = self.config.max_in_flight.max(1);

        // The tagged futures are built up front: mapping the closure through
        // the stream instead leaves a type rustc cannot prove Send when the
        // call sits inside an axum handler.
        let tagged: Vec<_> = requests
            .iter()
            .enumerate()
            .map(|(index, request)| async move {
                let outcome = self
                    .shipping_quote(&request.listing_id, &request.zip_code)
                    .await;
                let result = QuoteResult {
                    listing_id: request.listing_id.clone(),
                    outcome,
                };
                (index, result)
            })
            .collect();

        let mut indexed: Vec<(usize, QuoteResult)> = stream::iter(tagged)
            .buffer_unordered(limit)
            .collect()
            .await;

        // Completion order is nondeterministic; callers are promised input order.
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Run the full pipeline over a parsed batch: fetch every valid line
    /// concurrently and splice validation failures back in at their original
    /// positions. One [`LineQuote`] per input line, in input order.
    pub async fn quote_batch(&self, batch: BatchInput) -> Vec<LineQuote> {
        let requests = batch.valid_requests();
        let fetched = self.shipping_quotes(&requests).await;
        debug_assert_eq!(fetched.len(), requests.len());

        let mut fetched = fetched.into_iter();

        batch
            .lines
            .into_iter()
            .map(|line| match line.parsed {
                Ok(request) => {
                    let result = fetched.next().expect("one result per valid request");
                    LineQuote {
                        raw: line.raw,
                        listing_id: Some(request.listing_id),
                        outcome: result.outcome,
                    }
                }
                Err(err) => LineQuote {
                    raw: line.raw,
                    listing_id: None,
                    outcome: Err(err),
                },
            })
            .collect()
    }
}
