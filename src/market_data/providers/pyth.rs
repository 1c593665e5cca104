//! Pyth Network oracle prices via the Hermes HTTP API.
//!
//! Hermes addresses price streams by an opaque feed id rather than a ticker,
//! so a symbol is first resolved through `/v2/price_feeds` and then priced
//! with `/v2/updates/price/latest`. Prices arrive as an integer mantissa plus
//! a base-10 exponent and are decoded exactly.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::{AdapterError, FeedId, FeedIdCache, PriceSource, Quote, Symbol, USD};

pub const PYTH_BASE_URL: &str = "https://hermes.pyth.network";

/// Maps human symbols ("ETH", "ETH/USD") to Hermes feed ids.
pub struct PythFeedResolver {
    client: Client,
    base_url: String,
    cache: FeedIdCache,
}

impl PythFeedResolver {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: PYTH_BASE_URL.to_string(),
            cache: FeedIdCache::new(),
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

    pub fn with_cache(mut self, cache: FeedIdCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &FeedIdCache {
        &self.cache
    }

    /// Resolve `symbol` to a feed id, searching Hermes only on a cache miss.
    ///
    /// A bare asset ("eth") is searched as its USD pair ("ETH/USD"); the result
    /// is cached under both spellings.
    pub async fn resolve(&self, symbol: &str) -> Result<FeedId, AdapterError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AdapterError::NotFound(symbol));
        }

        let query = query_symbol(&symbol);
        if let Some(id) = self.cache.get(&symbol).or_else(|| self.cache.get(&query)) {
            debug!(symbol = %symbol, feed_id = %id, "feed id cache hit");
            return Ok(id);
        }

        let body = fetch_body(
            self.client
                .get(format!("{}/v2/price_feeds", self.base_url))
                .query(&[("query", query.as_str())]),
        )
        .await?;

        let id = parse_feed_search(&body, &query)?;
        let id = self.cache.insert(symbol.clone(), id);
        if query != symbol {
            self.cache.insert(query, id.clone());
        }
        debug!(symbol = %symbol, feed_id = %id, "resolved feed id");
        Ok(id)
    }
}

impl Default for PythFeedResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Oracle price source backed by Hermes.
pub struct PythPriceSource {
    resolver: PythFeedResolver,
}

impl PythPriceSource {
    pub fn new() -> Self {
        Self {
            resolver: PythFeedResolver::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.resolver = self.resolver.with_client(client);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_base_url(base_url);
        self
    }

    pub fn with_feed_cache(mut self, cache: FeedIdCache) -> Self {
        self.resolver = self.resolver.with_cache(cache);
        self
    }

    pub fn resolver(&self) -> &PythFeedResolver {
        &self.resolver
    }
}

impl Default for PythPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceSource for PythPriceSource {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError> {
        let feed_id = self.resolver.resolve(symbol.as_str()).await?;

        let body = fetch_body(
            self.resolver
                .client
                .get(format!("{}/v2/updates/price/latest", self.resolver.base_url))
                .query(&[("ids[]", feed_id.as_str()), ("parsed", "true")]),
        )
        .await?;

        let currency = symbol
            .as_str()
            .split_once('/')
            .map_or(USD, |(_, quote)| quote);
        Ok(parse_latest_update(&body, feed_id)?.with_currency(currency))
    }

    fn name(&self) -> &str {
        "pyth"
    }
}

/// "ETH" → "ETH/USD"; symbols that already name a pair are kept.
pub fn query_symbol(symbol: &str) -> String {
    if symbol.contains('/') {
        symbol.to_string()
    } else {
        format!("{symbol}/{USD}")
    }
}

/// Pick the first feed descriptor whose name equals `query_symbol`.
///
/// Names are read from `symbol`, `attributes.symbol` and
/// `attributes.display_symbol`, upper-cased, and compared exactly.
pub fn parse_feed_search(body: &str, query_symbol: &str) -> Result<FeedId, AdapterError> {
    let not_found = || AdapterError::NotFound(query_symbol.to_string());

    let feeds: Value = serde_json::from_str(body).map_err(|_| not_found())?;
    let feeds = feeds.as_array().ok_or_else(not_found)?;

    feeds
        .iter()
        .filter_map(Value::as_object)
        .find_map(|feed| {
            let id = feed
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())?;
            descriptor_names(feed)
                .any(|name| name == query_symbol)
                .then(|| FeedId::from(id))
        })
        .ok_or_else(not_found)
}

fn descriptor_names(feed: &Map<String, Value>) -> impl Iterator<Item = String> + '_ {
    let attributes = feed.get("attributes").and_then(Value::as_object);
    [
        feed.get("symbol"),
        attributes.and_then(|a| a.get("symbol")),
        attributes.and_then(|a| a.get("display_symbol")),
    ]
    .into_iter()
    .flatten()
    .map(|name| match name {
        Value::String(s) => s.to_uppercase(),
        other => other.to_string().to_uppercase(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LatestUpdateResponse {
    Wrapped {
        #[serde(default)]
        parsed: Option<Vec<ParsedUpdate>>,
    },
    Bare(Vec<ParsedUpdate>),
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    #[serde(default)]
    price: Option<RawPrice>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    price: RawInt,
    #[serde(default)]
    conf: Option<RawInt>,
    #[serde(default)]
    expo: i32,
    #[serde(default)]
    publish_time: Option<i64>,
}

/// Hermes sends mantissas as decimal strings; plain numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInt {
    Text(String),
    Number(i64),
}

impl RawInt {
    fn value(&self) -> Result<i128, AdapterError> {
        match self {
            RawInt::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| AdapterError::InvalidPrice(text.clone())),
            RawInt::Number(n) => Ok(i128::from(*n)),
        }
    }
}

/// Decode the first parsed price update for `feed_id`.
pub fn parse_latest_update(body: &str, feed_id: FeedId) -> Result<Quote, AdapterError> {
    let updates = match serde_json::from_str::<LatestUpdateResponse>(body)? {
        LatestUpdateResponse::Wrapped { parsed } => parsed.unwrap_or_default(),
        LatestUpdateResponse::Bare(updates) => updates,
    };

    let update = updates.into_iter().next().ok_or(AdapterError::Empty)?;
    let raw = update.price.ok_or(AdapterError::MissingField("parsed[0].price"))?;

    let price = decode_exponent(raw.price.value()?, raw.expo)?;
    let confidence = raw
        .conf
        .map(|conf| decode_exponent(conf.value()?, raw.expo))
        .transpose()?;
    let publish_time = raw
        .publish_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Ok(Quote::new(price, "pyth")?
        .with_confidence(confidence)
        .with_publish_time(publish_time)
        .with_feed_id(feed_id))
}

/// `mantissa × 10^expo`, applied as a decimal scale and never through `f64`.
pub fn decode_exponent(mantissa: i128, expo: i32) -> Result<Decimal, AdapterError> {
    let invalid = || AdapterError::InvalidPrice(format!("{mantissa}e{expo}"));

    let value = if expo < 0 {
        Decimal::try_from_i128_with_scale(mantissa, expo.unsigned_abs()).map_err(|_| invalid())?
    } else {
        let mut value = Decimal::try_from_i128_with_scale(mantissa, 0).map_err(|_| invalid())?;
        for _ in 0..expo {
            value = value.checked_mul(Decimal::TEN).ok_or_else(invalid)?;
        }
        value
    };

    Ok(value.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SEARCH_RESPONSE: &str = r#"[
        {
            "id": "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace",
            "attributes": {
                "asset_type": "Crypto",
                "base": "ETH",
                "display_symbol": "ETH/USD",
                "quote_currency": "USD",
                "symbol": "Crypto.ETH/USD"
            }
        },
        {
            "id": "0xdeadbeef",
            "symbol": "ETH/USD"
        }
    ]"#;

    const LATEST_RESPONSE: &str = r#"{
        "binary": {"encoding": "hex", "data": []},
        "parsed": [
            {
                "id": "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace",
                "price": {
                    "price": "205000000",
                    "conf": "150000",
                    "expo": -8,
                    "publish_time": 1705305600
                },
                "ema_price": {
                    "price": "204000000",
                    "conf": "160000",
                    "expo": -8,
                    "publish_time": 1705305600
                }
            }
        ]
    }"#;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn decodes_negative_exponent() {
        assert_eq!(decode_exponent(205_000_000, -8).unwrap(), dec("2.05"));
    }

    #[test]
    fn decodes_non_negative_exponent() {
        assert_eq!(decode_exponent(205, 2).unwrap(), dec("20500"));
        assert_eq!(decode_exponent(205, 0).unwrap(), dec("205"));
    }

    #[test]
    fn rejects_unrepresentable_exponents() {
        assert!(decode_exponent(1, -40).is_err());
        assert!(decode_exponent(i128::from(i64::MAX), 40).is_err());
    }

    #[test]
    fn query_symbol_defaults_to_usd_pair() {
        assert_eq!(query_symbol("ETH"), "ETH/USD");
        assert_eq!(query_symbol("ETH/EUR"), "ETH/EUR");
    }

    #[test]
    fn search_takes_first_exact_match_in_list_order() {
        let id = parse_feed_search(SEARCH_RESPONSE, "ETH/USD").unwrap();
        assert_eq!(
            id.as_str(),
            "ff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace"
        );
    }

    #[test]
    fn search_matches_top_level_symbol() {
        let body = r#"[{"id": "0x01", "symbol": "btc/usd"}]"#;
        assert_eq!(parse_feed_search(body, "BTC/USD").unwrap().as_str(), "0x01");
    }

    #[test]
    fn search_does_not_fuzzy_match() {
        let body = r#"[{"id": "0x01", "attributes": {"symbol": "Crypto.ETHX/USD"}}]"#;
        assert!(matches!(
            parse_feed_search(body, "ETH/USD"),
            Err(AdapterError::NotFound(_))
        ));
    }

    #[test]
    fn search_reports_not_found_for_empty_or_malformed_payloads() {
        for body in ["[]", "{}", "not json", r#"[1, "two"]"#] {
            assert!(
                matches!(parse_feed_search(body, "ETH/USD"), Err(AdapterError::NotFound(_))),
                "body: {body}"
            );
        }
    }

    #[test]
    fn latest_update_decodes_price_and_confidence() {
        let quote = parse_latest_update(LATEST_RESPONSE, FeedId::from("0xabc")).unwrap();

        assert_eq!(quote.price, dec("2.05"));
        assert_eq!(quote.confidence, Some(dec("0.0015")));
        assert_eq!(
            quote.publish_time,
            DateTime::<Utc>::from_timestamp(1_705_305_600, 0)
        );
        assert_eq!(quote.feed_id, Some(FeedId::from("0xabc")));
        assert_eq!(quote.source, "pyth");
    }

    #[test]
    fn latest_update_accepts_numeric_mantissa_and_bare_list() {
        let body = r#"[{"price": {"price": 205, "expo": 2}}]"#;
        let quote = parse_latest_update(body, FeedId::from("0xabc")).unwrap();
        assert_eq!(quote.price, dec("20500"));
        assert_eq!(quote.confidence, None);
    }

    #[test]
    fn latest_update_without_data_is_an_error() {
        assert!(matches!(
            parse_latest_update(r#"{"parsed": []}"#, FeedId::from("0x1")),
            Err(AdapterError::Empty)
        ));
        assert!(matches!(
            parse_latest_update(r#"{"parsed": [{"id": "0x1"}]}"#, FeedId::from("0x1")),
            Err(AdapterError::MissingField(_))
        ));
    }

    #[test]
    fn latest_update_rejects_negative_price() {
        let body = r#"{"parsed": [{"price": {"price": "-5", "expo": 0}}]}"#;
        assert!(matches!(
            parse_latest_update(body, FeedId::from("0x1")),
            Err(AdapterError::InvalidPrice(_))
        ));
    }
}
