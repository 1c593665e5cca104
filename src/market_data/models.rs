use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AdapterError, EmptySymbol, UnknownCategory};

pub const USD: &str = "USD";

/// Ticker symbol, upper-cased and trimmed (e.g. "ETH", "AMD", "2330.TW").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: &str) -> Result<Self, EmptySymbol> {
        let normalized = normalize_upper(raw);
        if normalized.is_empty() {
            return Err(EmptySymbol);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The listing code without any exchange suffix: "2330" for "2330.TW".
    pub fn base(&self) -> &str {
        self.0
            .split_once('.')
            .map_or(self.0.as_str(), |(base, _)| base)
    }

    pub fn has_exchange_suffix(&self) -> bool {
        self.0.contains('.')
    }

    /// "TWO" for "6488.TWO"; `None` without a suffix.
    pub fn exchange_suffix(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, suffix)| suffix)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Symbol {
    type Err = EmptySymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = EmptySymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Asset class of a holding. Decides which fallback chain prices it.
///
/// Deserializes through [`FromStr`], so section names are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Category {
    Crypto,
    UsStock,
    UsEtf,
    TwStock,
    TwEtf,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 5] = [
        Category::Crypto,
        Category::UsStock,
        Category::UsEtf,
        Category::TwStock,
        Category::TwEtf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "crypto",
            Category::UsStock => "us-stock",
            Category::UsEtf => "us-etf",
            Category::TwStock => "tw-stock",
            Category::TwEtf => "tw-etf",
        }
    }

    /// Currency the category's listings trade in.
    pub fn native_currency(&self) -> &'static str {
        match self {
            Category::Crypto | Category::UsStock | Category::UsEtf => USD,
            Category::TwStock | Category::TwEtf => "TWD",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Opaque id the oracle provider uses to address one price stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for FeedId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for FeedId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A price a provider vouched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    /// Currency `price` is denominated in.
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_id: Option<FeedId>,
    pub source: String,
}

impl Quote {
    /// A USD quote. Rejects negative prices.
    pub fn new(price: Decimal, source: impl Into<String>) -> Result<Self, AdapterError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(AdapterError::InvalidPrice(price.to_string()));
        }
        Ok(Self {
            price,
            currency: USD.to_string(),
            confidence: None,
            publish_time: None,
            feed_id: None,
            source: source.into(),
        })
    }

    pub fn with_currency(mut self, currency: impl AsRef<str>) -> Self {
        self.currency = normalize_upper(currency.as_ref());
        self
    }

    pub fn with_confidence(mut self, confidence: Option<Decimal>) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_publish_time(mut self, publish_time: Option<DateTime<Utc>>) -> Self {
        self.publish_time = publish_time;
        self
    }

    pub fn with_feed_id(mut self, feed_id: FeedId) -> Self {
        self.feed_id = Some(feed_id);
        self
    }

    /// Re-denominate the quote with `rate` (units of `currency` per unit of the current one).
    pub fn converted(mut self, rate: &ExchangeRate) -> Self {
        self.price *= rate.rate;
        self.confidence = self.confidence.map(|c| c * rate.rate);
        self.currency = rate.quote.clone();
        self
    }
}

/// Multiplier taking an amount in `base` to an amount in `quote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub rate: Decimal,
    pub source: String,
}

impl ExchangeRate {
    pub fn identity(currency: &str) -> Self {
        let currency = normalize_upper(currency);
        Self {
            base: currency.clone(),
            quote: currency,
            rate: Decimal::ONE,
            source: "identity".to_string(),
        }
    }
}

pub(crate) fn normalize_upper(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Parse a decimal price string as providers send them ("185.9200").
pub(crate) fn parse_price_str(value: &str) -> Result<Decimal, AdapterError> {
    Decimal::from_str(value.trim()).map_err(|_| AdapterError::InvalidPrice(value.to_string()))
}

pub(crate) fn price_from_f64(value: f64) -> Result<Decimal, AdapterError> {
    if !value.is_finite() {
        return Err(AdapterError::InvalidPrice(value.to_string()));
    }
    Decimal::from_f64(value).ok_or_else(|| AdapterError::InvalidPrice(value.to_string()))
}
