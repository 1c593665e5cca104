//! RedStone oracle-aggregator prices.
//!
//! The public prices API returns a list of recent observations; only the
//! newest one is requested.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::price_from_f64;
use crate::market_data::{AdapterError, PriceSource, Quote, Symbol};

pub const REDSTONE_BASE_URL: &str = "https://api.redstone.finance";

#[derive(Debug, Deserialize)]
struct RedstonePrice {
    value: f64,
    /// Milliseconds since the epoch.
    #[serde(default)]
    timestamp: Option<i64>,
}

pub struct RedstonePriceSource {
    client: Client,
    base_url: String,
}

impl RedstonePriceSource {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: REDSTONE_BASE_URL.to_string(),
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
}

impl Default for RedstonePriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceSource for RedstonePriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let body = fetch_body(self.client.get(format!("{}/prices/", self.base_url)).query(&[
            ("symbol", symbol.as_str()),
            ("provider", "redstone"),
            ("limit", "1"),
        ]))
        .await?;

        parse_prices(&body)
    }

    fn name(&self) -> &str {
        "redstone"
    }
}

pub fn parse_prices(body: &str) -> Result<Quote, AdapterError> {
    let prices: Vec<RedstonePrice> = serde_json::from_str(body)?;
    let latest = prices.into_iter().next().ok_or(AdapterError::Empty)?;

    let publish_time = latest
        .timestamp
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    Ok(Quote::new(price_from_f64(latest.value)?, "redstone")?.with_publish_time(publish_time))
}
