use reqwest::StatusCode;

/// A holding was filed under a category no price chain exists for.
///
/// This is the only failure that surfaces to callers as an error; everything a
/// provider can go wrong with is absorbed as "no price".
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown asset category: {0}")]
pub struct UnknownCategory(pub String);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("symbol must not be empty")]
pub struct EmptySymbol;

/// Why a single provider could not produce a price.
///
/// Never crosses the [`PriceSource::fetch_price`](super::PriceSource::fetch_price)
/// boundary: it is logged there and turned into `None`.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("response contained no price data")]
    Empty,

    #[error("provider reported an error: {0}")]
    Provider(String),

    #[error("no price feed matches {0}")]
    NotFound(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),
}

/// Failure of [`PriceResolver::resolve_named`](super::PriceResolver::resolve_named).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),

    #[error(transparent)]
    EmptySymbol(#[from] EmptySymbol),
}
