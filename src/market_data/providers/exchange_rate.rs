//! ExchangeRate-API (v6) FX rates.
//!
//! The `latest` endpoint returns every rate for one base currency; the quote
//! currency is picked out of `conversion_rates`. Requires an API key.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::credentials::{CredentialStore, EXCHANGE_RATE_KEY};
use crate::market_data::http::{build_client, fetch_body, trim_base_url, DEFAULT_TIMEOUT};
use crate::market_data::models::{normalize_upper, price_from_f64};
use crate::market_data::{AdapterError, ExchangeRate, FxRateSource};

pub const EXCHANGE_RATE_BASE_URL: &str = "https://v6.exchangerate-api.com";

const SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
}

pub struct ExchangeRateSource {
    api_key: SecretString,
    client: Client,
    base_url: String,
}

impl ExchangeRateSource {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            client: build_client(DEFAULT_TIMEOUT),
            base_url: EXCHANGE_RATE_BASE_URL.to_string(),
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

    /// Returns `Ok(None)` when the store has no ExchangeRate-API key.
    pub async fn from_credentials(store: &dyn CredentialStore) -> Result<Option<Self>> {
        Ok(store.get(EXCHANGE_RATE_KEY).await?.map(Self::new))
    }
}

#[async_trait::async_trait]
impl FxRateSource for ExchangeRateSource {
    async fn try_fetch_rate(&self, base: &str, quote: &str) -> Result<ExchangeRate, AdapterError> {
        let base = normalize_upper(base);
        let url = format!(
            "{}/v6/{}/latest/{base}",
            self.base_url,
            self.api_key.expose_secret()
        );
        let body = fetch_body(self.client.get(url)).await?;

        parse_latest(&body, &base, quote)
    }

    fn name(&self) -> &str {
        "exchange_rate"
    }
}

/// Pick the `base` → `quote` rate out of a `latest` response.
pub fn parse_latest(body: &str, base: &str, quote: &str) -> Result<ExchangeRate, AdapterError> {
    let response: LatestResponse = serde_json::from_str(body)?;
    if response.result != SUCCESS {
        let reason = response.error_type.unwrap_or(response.result);
        return Err(AdapterError::Provider(reason));
    }

    let quote = normalize_upper(quote);
    let rate = response
        .conversion_rates
        .get(&quote)
        .copied()
        .ok_or_else(|| AdapterError::NotFound(format!("{}/{quote}", normalize_upper(base))))?;

    if let Some(updated) = response
        .time_last_update_unix
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    {
        tracing::debug!(base, quote = %quote, %updated, "exchange rate fetched");
    }

    Ok(ExchangeRate {
        base: normalize_upper(base),
        quote,
        rate: price_from_f64(rate)?,
        source: "exchange_rate".to_string(),
    })
}
