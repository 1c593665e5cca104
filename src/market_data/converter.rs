use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use super::models::normalize_upper;
use super::{ExchangeRate, FxRateSource};

/// Re-denominates amounts with live rates.
///
/// Rates are fetched on every call. Same-currency conversion never touches the
/// network, and differing currencies without a rate stay unconverted (`None`)
/// rather than falling back to 1:1.
pub struct CurrencyConverter {
    sources: Vec<Arc<dyn FxRateSource>>,
}

impl CurrencyConverter {
    pub fn new(sources: Vec<Arc<dyn FxRateSource>>) -> Self {
        Self { sources }
    }

    /// A converter that can only handle same-currency conversions.
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub async fn rate(&self, base: &str, quote: &str) -> Option<ExchangeRate> {
        let base = normalize_upper(base);
        let quote = normalize_upper(quote);
        if base == quote {
            return Some(ExchangeRate::identity(&base));
        }

        for source in &self.sources {
            if let Some(rate) = source.fetch_rate(&base, &quote).await {
                return Some(rate);
            }
        }

        warn!(base = %base, quote = %quote, "no exchange rate available");
        None
    }

    pub async fn convert(&self, amount: Decimal, base: &str, quote: &str) -> Option<Decimal> {
        let rate = self.rate(base, quote).await?;
        amount.checked_mul(rate.rate)
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_currency_needs_no_source() {
        let converter = CurrencyConverter::disabled();
        assert_eq!(
            converter.convert(Decimal::from(42), "usd", "USD").await,
            Some(Decimal::from(42))
        );
    }

    #[tokio::test]
    async fn differing_currency_without_source_is_none() {
        let converter = CurrencyConverter::disabled();
        assert_eq!(converter.convert(Decimal::from(500), "TWD", "USD").await, None);
    }
}
