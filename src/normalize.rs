//! Input normalization for listing ids and ZIP codes.
//!
//! Free-form user input arrives as pasted text: listing ids separated by
//! commas or newlines, ZIP codes with CEP punctuation (`01.001-000`).
//! Everything here is local and synchronous; nothing touches the network.
//! Invalid lines are reported in place so valid lines can still proceed.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::QuoteError;
use crate::types::{BatchInput, InputLine, ListingId, QuoteRequest, ZipCode};

/// Canonical listing id shape: marketplace prefix plus digits.
static CANONICAL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}\d+$").expect("invalid listing id regex"));

/// Prefix prepended to bare numeric ids (Mercado Livre Brasil).
pub const DEFAULT_PREFIX: &str = "MLB";

/// Separator punctuation users paste inside ids and ZIPs.
fn is_separator(c: char) -> bool {
    matches!(c, '.' | '-') || c.is_whitespace()
}

/// Split raw id input on commas and newlines, trimming whitespace and
/// dropping empty pieces. Duplicate pieces are removed, first occurrence wins.
pub fn split_listing_ids(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .filter(|piece| seen.insert(piece.to_string()))
        .map(str::to_string)
        .collect()
}

/// Normalize one raw listing id to its canonical form.
///
/// Separator punctuation is stripped and the remainder uppercased. A bare
/// numeric id gets `prefix` prepended; an id already in canonical form passes
/// through. Anything else is rejected as malformed.
pub fn normalize_listing_id(raw: &str, prefix: &str) -> Result<ListingId, QuoteError> {
    let compact: String = raw.trim().chars().filter(|c| !is_separator(*c)).collect();
    let mut canonical = compact.to_uppercase();

    if !canonical.is_empty() && canonical.chars().all(|c| c.is_ascii_digit()) {
        canonical = format!("{}{}", prefix.to_uppercase(), canonical);
    }

    if CANONICAL_ID.is_match(&canonical) {
        Ok(ListingId::new(canonical))
    } else {
        Err(QuoteError::InvalidIdentifier(raw.trim().to_string()))
    }
}

/// Normalize a ZIP code by stripping every non-digit character.
pub fn normalize_zip_code(raw: &str) -> Result<ZipCode, QuoteError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        Err(QuoteError::InvalidZip(raw.trim().to_string()))
    } else {
        Ok(ZipCode::new(digits))
    }
}

/// Parse free-form user input into an ordered batch.
///
/// The shared ZIP is validated up front; an invalid ZIP fails the whole parse
/// before any line work. Each unique non-empty id piece then becomes one
/// [`InputLine`], valid lines carrying a ready [`QuoteRequest`] and invalid
/// lines carrying their validation error in place.
pub fn parse_batch(ids_text: &str, zip_text: &str, prefix: &str) -> Result<BatchInput, QuoteError> {
    let zip_code = normalize_zip_code(zip_text)?;

    let lines = split_listing_ids(ids_text)
        .into_iter()
        .map(|raw| {
            let parsed = normalize_listing_id(&raw, prefix).map(|listing_id| QuoteRequest {
                listing_id,
                zip_code: zip_code.clone(),
            });
            InputLine { raw, parsed }
        })
        .collect();

    Ok(BatchInput { zip_code, lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_digits_get_prefix() {
        let id = normalize_listing_id("1234567891", DEFAULT_PREFIX).unwrap();
        assert_eq!(id.as_str(), "MLB1234567891");
    }

    #[test]
    fn test_canonical_passthrough() {
        let id = normalize_listing_id("MLB1234567891", DEFAULT_PREFIX).unwrap();
        assert_eq!(id.as_str(), "MLB1234567891");

        // Lowercase and other marketplace prefixes canonicalize too.
        let id = normalize_listing_id("mlb987", DEFAULT_PREFIX).unwrap();
        assert_eq!(id.as_str(), "MLB987");
        let id = normalize_listing_id("MLA456", DEFAULT_PREFIX).unwrap();
        assert_eq!(id.as_str(), "MLA456");
    }

    #[test]
    fn test_separators_stripped() {
        assert_eq!(
            normalize_listing_id("MLB-1234", DEFAULT_PREFIX).unwrap().as_str(),
            "MLB1234"
        );
        assert_eq!(
            normalize_listing_id("mlb 12.34", DEFAULT_PREFIX).unwrap().as_str(),
            "MLB1234"
        );
        assert_eq!(
            normalize_listing_id(" 12-345 ", DEFAULT_PREFIX).unwrap().as_str(),
            "MLB12345"
        );
    }

    #[test]
    fn test_malformed_ids_rejected() {
        for raw in ["", "MLB", "M1B123", "123abc", "not-an-id!", "MLBX123"] {
            let err = normalize_listing_id(raw, DEFAULT_PREFIX).unwrap_err();
            assert!(
                matches!(err, QuoteError::InvalidIdentifier(_)),
                "expected InvalidIdentifier for {:?}, got {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_zip_strips_punctuation() {
        let dotted = normalize_zip_code("01.001-000").unwrap();
        let plain = normalize_zip_code("01001000").unwrap();
        assert_eq!(dotted, plain);
        assert_eq!(dotted.as_str(), "01001000");
    }

    #[test]
    fn test_zip_without_digits_rejected() {
        assert!(matches!(
            normalize_zip_code(""),
            Err(QuoteError::InvalidZip(_))
        ));
        assert!(matches!(
            normalize_zip_code("abc-def"),
            Err(QuoteError::InvalidZip(_))
        ));
    }

    #[test]
    fn test_split_on_commas_and_newlines() {
        let pieces = split_listing_ids("MLB1, MLB2\nMLB3,\n\n  MLB4  ");
        assert_eq!(pieces, vec!["MLB1", "MLB2", "MLB3", "MLB4"]);
    }

    #[test]
    fn test_split_dedups_first_occurrence() {
        let pieces = split_listing_ids("MLB2,MLB1,MLB2\nMLB1,MLB3");
        assert_eq!(pieces, vec!["MLB2", "MLB1", "MLB3"]);
    }

    #[test]
    fn test_parse_batch_keeps_invalid_lines_in_place() {
        let batch = parse_batch("MLB1000\nbogus!,2000", "01.001-000", DEFAULT_PREFIX).unwrap();
        assert_eq!(batch.zip_code.as_str(), "01001000");
        assert_eq!(batch.len(), 3);

        assert_eq!(batch.lines[0].raw, "MLB1000");
        assert!(batch.lines[0].parsed.is_ok());

        assert_eq!(batch.lines[1].raw, "bogus!");
        assert!(matches!(
            batch.lines[1].parsed,
            Err(QuoteError::InvalidIdentifier(_))
        ));

        let request = batch.lines[2].parsed.as_ref().unwrap();
        assert_eq!(request.listing_id.as_str(), "MLB2000");
        assert_eq!(request.zip_code.as_str(), "01001000");

        // Only the valid lines become requests, in input order.
        let requests = batch.valid_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].listing_id.as_str(), "MLB1000");
        assert_eq!(requests[1].listing_id.as_str(), "MLB2000");
    }

    #[test]
    fn test_parse_batch_rejects_bad_zip_up_front() {
        let err = parse_batch("MLB1000", "no digits", DEFAULT_PREFIX).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidZip(_)));
    }
}
