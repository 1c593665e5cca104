//! Taiwan Stock Exchange market-information quotes, for both TWSE and TPEx
//! (OTC) listings.
//!
//! Prices are in TWD. When a listing hasn't traded yet today the last trade
//! field is "-", so the best ask/bid (geometric mean) and then the previous
//! close stand in for it.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::{Decimal, MathematicalOps};
use serde::Deserialize;

use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::parse_price_str;
use crate::market_data::{AdapterError, PriceSource, Quote, Symbol};

pub const TWSE_BASE_URL: &str = "https://mis.twse.com.tw";

const TWD: &str = "TWD";

/// Placeholder the exchange uses for "no value".
const NO_VALUE: &str = "-";

#[derive(Debug, Deserialize)]
struct StockInfoResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<StockInfo>,
}

#[derive(Debug, Deserialize)]
struct StockInfo {
    /// Last traded price.
    #[serde(default)]
    z: Option<String>,
    /// Ask prices, best first, "_"-separated.
    #[serde(default)]
    a: Option<String>,
    /// Bid prices, best first, "_"-separated.
    #[serde(default)]
    b: Option<String>,
    /// Previous close.
    #[serde(default)]
    y: Option<String>,
    /// Quote time, milliseconds since the epoch.
    #[serde(default)]
    tlong: Option<String>,
}

pub struct TwsePriceSource {
    client: Client,
    base_url: String,
}

impl TwsePriceSource {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: TWSE_BASE_URL.to_string(),
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

impl Default for TwsePriceSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Channel name for a listing: "2330.TW" → "tse_2330.tw". Over-the-counter
/// listings ("6488.TWO") use the `otc` market.
pub fn exchange_channel(symbol: &Symbol) -> String {
    let market = match symbol.exchange_suffix() {
        Some("TWO") => "otc",
        _ => "tse",
    };
    format!("{market}_{}.tw", symbol.base())
}

#[async_trait::async_trait]
impl PriceSource for TwsePriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let channel = exchange_channel(symbol);
        let body = fetch_body(
            self.client
                .get(format!("{}/stock/api/getStockInfo.jsp", self.base_url))
                .query(&[("ex_ch", channel.as_str())]),
        )
        .await?;

        parse_stock_info(&body)
    }

    fn name(&self) -> &str {
        "twse"
    }
}

pub fn parse_stock_info(body: &str) -> Result<Quote, AdapterError> {
    let response: StockInfoResponse = serde_json::from_str(body)?;
    let stock = response.msg_array.into_iter().next().ok_or(AdapterError::Empty)?;

    let price = match present(stock.z.as_deref()) {
        Some(last) => parse_price_str(last)?,
        None => match best_quote_mean(stock.a.as_deref(), stock.b.as_deref()) {
            Some(mid) => mid,
            None => {
                let previous = present(stock.y.as_deref()).ok_or(AdapterError::MissingField("y"))?;
                parse_price_str(previous)?
            }
        },
    };

    let publish_time = stock
        .tlong
        .as_deref()
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    Ok(Quote::new(price, "twse")?
        .with_currency(TWD)
        .with_publish_time(publish_time))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != NO_VALUE)
}

/// Geometric mean of the best ask and best bid, if both parse.
///
/// Rounded to the exchange's four quoted decimal places.
fn best_quote_mean(asks: Option<&str>, bids: Option<&str>) -> Option<Decimal> {
    let best = |side: Option<&str>| {
        let first = present(side)?.split('_').next()?;
        parse_price_str(first).ok()
    };
    let product = best(asks)?.checked_mul(best(bids)?)?;
    product.sqrt().map(|mean| mean.round_dp(4).normalize())
}
