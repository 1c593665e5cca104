use tracing::warn;

use super::{AdapterError, ExchangeRate, Quote, Symbol};

/// One external price provider.
///
/// Implementations make a single attempt in [`try_fetch`](Self::try_fetch).
/// Callers use [`fetch_price`](Self::fetch_price), which logs the failure and
/// reports it as "no price".
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn try_fetch(&self, symbol: &Symbol) -> Result<Quote, AdapterError>;

    fn name(&self) -> &str;

    async fn fetch_price(&self, symbol: &Symbol) -> Option<Quote> {
        match self.try_fetch(symbol).await {
            Ok(quote) => Some(quote),
            Err(error) => {
                warn!(provider = self.name(), symbol = %symbol, error = %error, "no price from provider");
                None
            }
        }
    }
}

#[async_trait::async_trait]
pub trait FxRateSource: Send + Sync {
    async fn try_fetch_rate(&self, base: &str, quote: &str) -> Result<ExchangeRate, AdapterError>;

    fn name(&self) -> &str;

    async fn fetch_rate(&self, base: &str, quote: &str) -> Option<ExchangeRate> {
        match self.try_fetch_rate(base, quote).await {
            Ok(rate) => Some(rate),
            Err(error) => {
                warn!(provider = self.name(), base, quote, error = %error, "no exchange rate from provider");
                None
            }
        }
    }
}
