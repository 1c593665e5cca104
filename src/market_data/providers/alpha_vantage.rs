//! Alpha Vantage quote provider.
//!
//! Uses the GLOBAL_QUOTE endpoint for the latest traded price.
//! Note: Free tier is limited to 25 requests/day.

use anyhow::Result;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::credentials::{CredentialStore, ALPHA_VANTAGE_KEY};
use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::parse_price_str;
use crate::market_data::{AdapterError, PriceSource, Quote, Symbol};

pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage provider for latest quotes.
pub struct AlphaVantagePriceSource {
    api_key: String,
    client: Client,
    base_url: String,
}

impl AlphaVantagePriceSource {
    /// Create a new Alpha Vantage price source with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: build_client(DEFAULT_TIMEOUT),
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    /// Create a new Alpha Vantage price source from a credential store.
    ///
    /// Returns `Ok(None)` when the store has no Alpha Vantage key.
    pub async fn from_credentials(store: &dyn CredentialStore) -> Result<Option<Self>> {
        let api_key = store.get(ALPHA_VANTAGE_KEY).await?;
        Ok(api_key.map(|key| Self::new(key.expose_secret())))
    }
}

#[async_trait::async_trait]
impl PriceSource for AlphaVantagePriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let body = fetch_body(self.client.get(format!("{}/query", self.base_url)).query(&[
            ("function", "GLOBAL_QUOTE"),
            ("symbol", symbol.as_str()),
            ("apikey", self.api_key.as_str()),
        ]))
        .await?;

        parse_global_quote(&body)
    }

    fn name(&self) -> &str {
        "alpha_vantage"
    }
}

/// Parse a GLOBAL_QUOTE response.
///
/// Alpha Vantage answers 200 for rate limits and bad keys, so the error
/// envelope is checked before the quote itself.
pub fn parse_global_quote(body: &str) -> Result<Quote, AdapterError> {
    let error: ErrorResponse = serde_json::from_str(body)?;
    if let Some(msg) = error.error_message {
        return Err(AdapterError::Provider(msg));
    }
    if let Some(note) = error.note {
        return Err(AdapterError::Provider(format!("rate limit: {note}")));
    }
    if let Some(info) = error.information {
        return Err(AdapterError::Provider(info));
    }

    let response: GlobalQuoteResponse = serde_json::from_str(body)?;
    let price = response
        .global_quote
        .and_then(|quote| quote.price)
        .ok_or(AdapterError::MissingField("Global Quote.05. price"))?;

    Quote::new(parse_price_str(&price)?, "alpha_vantage")
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

/// Error response from Alpha Vantage API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,
}
