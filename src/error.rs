//! Per-item error taxonomy for shipping quote lookups.
//!
//! Every failure is local to a single listing: a malformed input line or a
//! failed request never aborts the rest of the batch. Batch operations return
//! these inside per-item results instead of propagating them upward.

use thiserror::Error;

/// Why one listing could not be quoted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    /// The input line is not a listing id in any accepted form.
    #[error("invalid listing id '{0}': expected a marketplace prefix followed by digits")]
    InvalidIdentifier(String),

    /// The ZIP code input carries no digits at all.
    #[error("invalid ZIP code '{0}': no digits found")]
    InvalidZip(String),

    /// Connection or timeout failure while calling the API.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success HTTP status.
    #[error("API error ({status}): {reason}")]
    Api { status: u16, reason: String },

    /// The payload decoded but lacked the expected shape or cost field.
    #[error("parse error: {0}")]
    Parse(String),
}

impl QuoteError {
    /// Map an HTTP status to the reason shown next to the listing.
    pub fn api(status: u16) -> Self {
        let reason = match status {
            404 => "item not found, verify the listing id",
            429 => "too many requests, wait before retrying",
            500 => "server error on the Mercado Livre side",
            _ => "unexpected HTTP status",
        };
        QuoteError::Api {
            status,
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QuoteError::Network("request timed out".to_string())
        } else if err.is_connect() {
            QuoteError::Network("could not connect to the server".to_string())
        } else if err.is_decode() {
            QuoteError::Parse("unexpected response shape".to_string())
        } else {
            QuoteError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(err: serde_json::Error) -> Self {
        QuoteError::Parse(format!("unexpected response shape: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reasons() {
        assert!(QuoteError::api(404).to_string().contains("not found"));
        assert!(QuoteError::api(429).to_string().contains("too many requests"));
        assert!(QuoteError::api(500).to_string().contains("server error"));
        assert!(QuoteError::api(503).to_string().contains("unexpected HTTP status"));
    }

    #[test]
    fn test_status_is_carried() {
        let err = QuoteError::api(404);
        assert_eq!(err, QuoteError::Api {
            status: 404,
            reason: "item not found, verify the listing id".to_string(),
        });
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_json_errors_become_parse() {
        let bad = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(QuoteError::from(bad), QuoteError::Parse(_)));
    }
}
