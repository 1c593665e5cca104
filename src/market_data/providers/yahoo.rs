//! Yahoo Finance chart endpoint, used as the general market-data provider.
//!
//! The daily chart for the current day is requested and the latest non-null
//! close is taken as the price.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::{normalize_upper, price_from_f64};
use crate::market_data::{AdapterError, PriceSource, Quote, Symbol, USD};

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    /// Intervals without trades come back as null.
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo chart provider.
///
/// Listings outside the US need an exchange suffix ("2330.TW"); configure one
/// with [`with_exchange_suffix`](Self::with_exchange_suffix) and it is appended
/// to symbols that don't already carry a suffix. Charts without a
/// `meta.currency` are taken to be in the
/// [default currency](Self::with_default_currency), USD unless set.
pub struct YahooPriceSource {
    client: Client,
    base_url: String,
    exchange_suffix: Option<String>,
    default_currency: String,
}

impl YahooPriceSource {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: YAHOO_BASE_URL.to_string(),
            exchange_suffix: None,
            default_currency: USD.to_string(),
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

    pub fn with_exchange_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into().trim().trim_start_matches('.').to_uppercase();
        self.exchange_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.default_currency = normalize_upper(currency);
        self
    }

    pub fn ticker(&self, symbol: &Symbol) -> String {
        match &self.exchange_suffix {
            Some(suffix) if !symbol.has_exchange_suffix() => format!("{symbol}.{suffix}"),
            _ => symbol.to_string(),
        }
    }
}

impl Default for YahooPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceSource for YahooPriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let ticker = self.ticker(symbol);
        let body = fetch_body(
            self.client
                .get(format!("{}/v8/finance/chart/{ticker}", self.base_url))
                .query(&[("interval", "1d"), ("range", "1d")]),
        )
        .await?;

        parse_chart(&body, &self.default_currency)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// `default_currency` labels the price when the chart doesn't say.
pub fn parse_chart(body: &str, default_currency: &str) -> Result<Quote, AdapterError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        let detail = error.description.unwrap_or_default();
        return Err(AdapterError::Provider(format!("{}: {detail}", error.code)));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(AdapterError::Empty)?;

    let close = result
        .indicators
        .quote
        .first()
        .and_then(|quote| quote.close.iter().rev().find_map(|close| *close))
        .ok_or(AdapterError::MissingField("indicators.quote[0].close"))?;

    let (currency, market_time) = match result.meta {
        Some(meta) => (meta.currency, meta.regular_market_time),
        None => (None, None),
    };

    Ok(Quote::new(price_from_f64(close)?, "yahoo")?
        .with_currency(currency.as_deref().unwrap_or(default_currency))
        .with_publish_time(market_time.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const SAMPLE_RESPONSE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "TWD",
                    "symbol": "2330.TW",
                    "regularMarketPrice": 580.0,
                    "regularMarketTime": 1705305600
                },
                "timestamp": [1705280400, 1705305600],
                "indicators": {
                    "quote": [{
                        "open": [575.0, 578.0],
                        "close": [578.0, 580.0, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn takes_latest_non_null_close() {
        let quote = parse_chart(SAMPLE_RESPONSE, USD).unwrap();
        assert_eq!(quote.price, Decimal::from_str("580").unwrap());
        assert_eq!(quote.currency, "TWD");
        assert_eq!(
            quote.publish_time,
            DateTime::<Utc>::from_timestamp(1_705_305_600, 0)
        );
        assert_eq!(quote.source, "yahoo");
    }

    #[test]
    fn chart_error_is_provider_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(body, USD).unwrap_err();
        assert!(matches!(err, AdapterError::Provider(ref m) if m.starts_with("Not Found")));
    }

    #[test]
    fn all_null_closes_are_missing() {
        let body = r#"{"chart": {"result": [{"indicators": {"quote": [{"close": [null, null]}]}}], "error": null}}"#;
        assert!(matches!(parse_chart(body, USD), Err(AdapterError::MissingField(_))));
    }

    #[test]
    fn empty_result_is_no_data() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        assert!(matches!(parse_chart(body, USD), Err(AdapterError::Empty)));
    }

    #[test]
    fn chart_without_meta_uses_default_currency() {
        let body = r#"{"chart": {"result": [{"indicators": {"quote": [{"close": [189.5]}]}}]}}"#;
        assert_eq!(parse_chart(body, USD).unwrap().currency, "USD");
        assert_eq!(parse_chart(body, "TWD").unwrap().currency, "TWD");
    }

    #[test]
    fn exchange_suffix_only_added_when_missing() {
        let tw = YahooPriceSource::new().with_exchange_suffix(".tw");
        assert_eq!(tw.ticker(&Symbol::new("2330").unwrap()), "2330.TW");
        assert_eq!(tw.ticker(&Symbol::new("6488.TWO").unwrap()), "6488.TWO");

        let us = YahooPriceSource::new();
        assert_eq!(us.ticker(&Symbol::new("aapl").unwrap()), "AAPL");
    }
}
