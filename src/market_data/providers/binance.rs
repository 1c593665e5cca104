//! Binance spot ticker prices.
//!
//! Binance quotes trading pairs, so a bare asset is priced against USDT.

use reqwest::Client;
use serde::Deserialize;

use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::parse_price_str;
use crate::market_data::{AdapterError, PriceSource, Quote, Symbol};

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

const QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TickerResponse {
    Ticker { price: String },
    Error { code: i64, msg: String },
}

pub struct BinancePriceSource {
    client: Client,
    base_url: String,
}

impl BinancePriceSource {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: BINANCE_BASE_URL.to_string(),
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

impl Default for BinancePriceSource {
    fn default() -> Self {
        Self::new()
    }
}

/// "ETH" → "ETHUSDT".
pub fn trading_pair(symbol: &Symbol) -> String {
    format!("{}{QUOTE_ASSET}", symbol.as_str())
}

#[async_trait::async_trait]
impl PriceSource for BinancePriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let pair = trading_pair(symbol);
        let body = fetch_body(
            self.client
                .get(format!("{}/api/v3/ticker/price", self.base_url))
                .query(&[("symbol", pair.as_str())]),
        )
        .await?;

        parse_ticker(&body)
    }

    fn name(&self) -> &str {
        "binance"
    }
}

pub fn parse_ticker(body: &str) -> Result<Quote, AdapterError> {
    match serde_json::from_str::<TickerResponse>(body)? {
        TickerResponse::Ticker { price } => Ok(Quote::new(parse_price_str(&price)?, "binance")?),
        TickerResponse::Error { code, msg } => Err(AdapterError::Provider(format!("{code}: {msg}"))),
    }
}
