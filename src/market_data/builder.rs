use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::clock::{Clock, SystemClock};
use crate::config::{ProvidersConfig, ResolvedConfig};
use crate::credentials::CredentialStore;
use crate::market_data::http::{build_client, DEFAULT_TIMEOUT};
use crate::market_data::providers::{
    AlphaVantagePriceSource, BinancePriceSource, ExchangeRateSource, PythPriceSource,
    RedstonePriceSource, TwsePriceSource, YahooPriceSource,
};
use crate::market_data::{
    Category, CurrencyConverter, FeedIdCache, FxRateSource, PriceResolver, PriceSource,
};

/// Exchange suffix Yahoo uses for Taiwan Stock Exchange listings.
const TW_EXCHANGE_SUFFIX: &str = "TW";

/// Builds a [`PriceResolver`] with the standard chains:
///
/// - crypto: pyth → redstone → binance → alpha_vantage
/// - us-stock, us-etf: pyth → yahoo
/// - tw-stock, tw-etf: twse → yahoo (".TW"), converted to USD
///
/// Providers that need a key are left out of their chain when the key is
/// missing.
pub struct PriceResolverBuilder {
    timeout: Duration,
    providers: ProvidersConfig,
    feed_cache_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl PriceResolverBuilder {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            providers: ProvidersConfig::default(),
            feed_cache_ttl: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new()
            .with_timeout(config.http.timeout)
            .with_providers(config.providers.clone())
            .with_feed_cache_ttl(config.feed_cache.ttl)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL overrides.
    pub fn with_providers(mut self, providers: ProvidersConfig) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_feed_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.feed_cache_ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn build(self, credentials: &dyn CredentialStore) -> PriceResolver {
        let client = build_client(self.timeout);
        let urls = &self.providers;

        let feed_cache = FeedIdCache::new()
            .with_clock(self.clock.clone())
            .with_ttl(self.feed_cache_ttl);
        let pyth: Arc<dyn PriceSource> = Arc::new(override_base_url(
            PythPriceSource::new()
                .with_client(client.clone())
                .with_feed_cache(feed_cache),
            &urls.pyth,
            |source, url| source.with_base_url(url),
        ));
        let yahoo: Arc<dyn PriceSource> = Arc::new(self.yahoo(&client, Category::UsStock));

        let mut crypto: Vec<Arc<dyn PriceSource>> = vec![pyth.clone()];
        crypto.push(Arc::new(override_base_url(
            RedstonePriceSource::new().with_client(client.clone()),
            &urls.redstone,
            |source, url| source.with_base_url(url),
        )));
        crypto.push(Arc::new(override_base_url(
            BinancePriceSource::new().with_client(client.clone()),
            &urls.binance,
            |source, url| source.with_base_url(url),
        )));
        match AlphaVantagePriceSource::from_credentials(credentials).await {
            Ok(Some(source)) => crypto.push(Arc::new(override_base_url(
                source.with_client(client.clone()),
                &urls.alpha_vantage,
                |source, url| source.with_base_url(url),
            ))),
            Ok(None) => {
                tracing::warn!("no Alpha Vantage API key; crypto chain ends at binance");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read Alpha Vantage API key; skipping provider");
            }
        }

        let us_equity = vec![pyth, yahoo];

        let mut tw_equity: Vec<Arc<dyn PriceSource>> = Vec::new();
        tw_equity.push(Arc::new(override_base_url(
            TwsePriceSource::new().with_client(client.clone()),
            &urls.twse,
            |source, url| source.with_base_url(url),
        )));
        tw_equity.push(Arc::new(self.yahoo(&client, Category::TwStock)));

        let mut fx_sources: Vec<Arc<dyn FxRateSource>> = Vec::new();
        match ExchangeRateSource::from_credentials(credentials).await {
            Ok(Some(source)) => fx_sources.push(Arc::new(override_base_url(
                source.with_client(client.clone()),
                &urls.exchange_rate,
                |source, url| source.with_base_url(url),
            ))),
            Ok(None) => {
                tracing::warn!("no ExchangeRate-API key; non-USD prices and cash will be missing");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read ExchangeRate-API key; skipping FX");
            }
        }

        PriceResolver::new(CurrencyConverter::new(fx_sources))
            .with_crypto_chain(crypto)
            .with_us_equity_chain(us_equity)
            .with_tw_equity_chain(tw_equity)
    }

    /// Yahoo for one market: TW listings get the ".TW" suffix and are read as
    /// TWD when the chart omits its currency.
    fn yahoo(&self, client: &Client, category: Category) -> YahooPriceSource {
        let mut yahoo = YahooPriceSource::new()
            .with_client(client.clone())
            .with_default_currency(category.native_currency());
        if matches!(category, Category::TwStock | Category::TwEtf) {
            yahoo = yahoo.with_exchange_suffix(TW_EXCHANGE_SUFFIX);
        }
        override_base_url(yahoo, &self.providers.yahoo, |source, url| {
            source.with_base_url(url)
        })
    }
}

impl Default for PriceResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn override_base_url<T>(source: T, base_url: &Option<String>, apply: fn(T, String) -> T) -> T {
    match base_url {
        Some(url) => apply(source, url.clone()),
        None => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ApiKeyFile;

    #[tokio::test]
    async fn chains_follow_category_order() -> anyhow::Result<()> {
        let keys = ApiKeyFile::from_toml_str(
            "alpha_vantage_api_key = \"demo\"\nexchangerate_api_key = \"fx\"",
        )?;
        let resolver = PriceResolverBuilder::new().build(&keys).await;

        assert_eq!(
            resolver.chain_names(Category::Crypto),
            vec!["pyth", "redstone", "binance", "alpha_vantage"]
        );
        assert_eq!(resolver.chain_names(Category::UsStock), vec!["pyth", "yahoo"]);
        assert_eq!(resolver.chain_names(Category::UsEtf), vec!["pyth", "yahoo"]);
        assert_eq!(resolver.chain_names(Category::TwStock), vec!["twse", "yahoo"]);
        assert_eq!(resolver.chain_names(Category::TwEtf), vec!["twse", "yahoo"]);
        assert!(resolver.converter().has_sources());
        Ok(())
    }

    #[tokio::test]
    async fn keyless_providers_are_omitted() -> anyhow::Result<()> {
        let keys = ApiKeyFile::from_toml_str("")?;
        let resolver = PriceResolverBuilder::new().build(&keys).await;

        assert_eq!(
            resolver.chain_names(Category::Crypto),
            vec!["pyth", "redstone", "binance"]
        );
        assert!(!resolver.converter().has_sources());
        Ok(())
    }
}
