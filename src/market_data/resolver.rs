//! Category-specific fallback chains.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Category, CurrencyConverter, PriceSource, Quote, ResolveError, Symbol, USD};

/// Ordered providers tried for one group of categories.
pub type Chain = Vec<Arc<dyn PriceSource>>;

/// Prices a (symbol, category) pair by walking that category's chain.
///
/// The first provider to return a quote wins; later providers are never
/// called. Quotes that aren't in USD are converted before being returned.
pub struct PriceResolver {
    crypto: Chain,
    us_equity: Chain,
    tw_equity: Chain,
    converter: CurrencyConverter,
}

impl PriceResolver {
    /// A resolver with empty chains. Every lookup yields `None` until chains
    /// are configured.
    pub fn new(converter: CurrencyConverter) -> Self {
        Self {
            crypto: Vec::new(),
            us_equity: Vec::new(),
            tw_equity: Vec::new(),
            converter,
        }
    }

    pub fn with_crypto_chain(mut self, chain: Chain) -> Self {
        self.crypto = chain;
        self
    }

    /// Chain shared by `us-stock` and `us-etf`.
    pub fn with_us_equity_chain(mut self, chain: Chain) -> Self {
        self.us_equity = chain;
        self
    }

    /// Chain shared by `tw-stock` and `tw-etf`. Providers here quote in TWD.
    pub fn with_tw_equity_chain(mut self, chain: Chain) -> Self {
        self.tw_equity = chain;
        self
    }

    pub fn chain(&self, category: Category) -> &[Arc<dyn PriceSource>] {
        match category {
            Category::Crypto => &self.crypto,
            Category::UsStock | Category::UsEtf => &self.us_equity,
            Category::TwStock | Category::TwEtf => &self.tw_equity,
        }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Provider names tried for `category`, in order.
    pub fn chain_names(&self, category: Category) -> Vec<&str> {
        self.chain(category).iter().map(|source| source.name()).collect()
    }

    /// USD quote for `symbol`, or `None` when no provider in the chain had one
    /// (or its price couldn't be converted to USD).
    pub async fn resolve(&self, symbol: &Symbol, category: Category) -> Option<Quote> {
        let quote = self.first_quote(symbol, category).await?;
        if quote.currency == USD {
            return Some(quote);
        }

        let rate = self.converter.rate(&quote.currency, USD).await;
        match rate {
            Some(rate) => Some(quote.converted(&rate)),
            None => {
                warn!(
                    symbol = %symbol,
                    currency = %quote.currency,
                    "price found but could not be converted to USD"
                );
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve), from raw config strings.
    ///
    /// The category is checked first: an unknown category is an error even for
    /// a symbol that would otherwise be rejected.
    pub async fn resolve_named(
        &self,
        symbol: &str,
        category: &str,
    ) -> Result<Option<Quote>, ResolveError> {
        let category: Category = category.parse()?;
        let symbol = Symbol::new(symbol)?;
        Ok(self.resolve(&symbol, category).await)
    }

    async fn first_quote(&self, symbol: &Symbol, category: Category) -> Option<Quote> {
        let mut last = None;
        for source in self.chain(category) {
            debug!(provider = source.name(), symbol = %symbol, category = %category, "trying provider");
            last = source.fetch_price(symbol).await;
            if let Some(quote) = &last {
                info!(provider = source.name(), symbol = %symbol, price = %quote.price, "price resolved");
                break;
            }
        }
        last
    }
}
