pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{MeliClient, MeliConfig};
pub use error::QuoteError;
pub use normalize::{DEFAULT_PREFIX, normalize_listing_id, normalize_zip_code, parse_batch};
pub use types::{
    BatchInput, LineQuote, ListingId, QuoteRequest, QuoteResult, ShippingQuote, ZipCode,
};
