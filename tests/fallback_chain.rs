mod support;

use anyhow::Result;
use pricebook::market_data::{
    Category, CurrencyConverter, EmptySymbol, PriceResolver, Quote, ResolveError, UnknownCategory,
};
use support::{chain, converter, dec, symbol, StubFx, StubSource};

#[tokio::test]
async fn crypto_stops_at_first_provider_with_a_price() -> Result<()> {
    let pyth = StubSource::failing("pyth");
    let redstone = StubSource::priced("redstone", "2500.0");
    let binance = StubSource::priced("binance", "2600");
    let alpha_vantage = StubSource::priced("alpha_vantage", "2700");

    let resolver = PriceResolver::new(CurrencyConverter::disabled()).with_crypto_chain(chain([
        &pyth,
        &redstone,
        &binance,
        &alpha_vantage,
    ]));

    let quote = resolver.resolve(&symbol("ETH"), Category::Crypto).await;
    let quote = quote.expect("expected a price");

    assert_eq!(quote.price, dec("2500"));
    assert_eq!(quote.source, "redstone");
    assert_eq!(pyth.calls(), 1);
    assert_eq!(redstone.calls(), 1);
    assert_eq!(binance.calls(), 0);
    assert_eq!(alpha_vantage.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn exhausted_chain_is_none_not_error() -> Result<()> {
    let pyth = StubSource::failing("pyth");
    let yahoo = StubSource::failing("yahoo");

    let resolver = PriceResolver::new(CurrencyConverter::disabled())
        .with_us_equity_chain(chain([&pyth, &yahoo]));

    let quote = resolver.resolve_named("AMD", "us-stock").await?;

    assert!(quote.is_none());
    assert_eq!(pyth.calls(), 1);
    assert_eq!(yahoo.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn us_etfs_share_the_us_chain() -> Result<()> {
    let pyth = StubSource::failing("pyth");
    let yahoo = StubSource::priced("yahoo", "480.12");
    let resolver = PriceResolver::new(CurrencyConverter::disabled())
        .with_us_equity_chain(chain([&pyth, &yahoo]));

    let quote = resolver.resolve(&symbol("spy"), Category::UsEtf).await;

    assert_eq!(quote.map(|q| q.price), Some(dec("480.12")));
    assert_eq!(yahoo.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_category_is_a_hard_error() {
    let pyth = StubSource::priced("pyth", "1");
    let resolver =
        PriceResolver::new(CurrencyConverter::disabled()).with_crypto_chain(chain([&pyth]));

    let result = resolver.resolve_named("XXX", "bonds").await;

    assert_eq!(
        result,
        Err(ResolveError::UnknownCategory(UnknownCategory("bonds".to_string())))
    );
    assert_eq!(pyth.calls(), 0);
}

#[tokio::test]
async fn empty_symbol_is_rejected() {
    let resolver = PriceResolver::new(CurrencyConverter::disabled());
    let result = resolver.resolve_named("   ", "crypto").await;
    assert_eq!(result, Err(ResolveError::EmptySymbol(EmptySymbol)));
}

#[tokio::test]
async fn taiwan_prices_are_converted_to_usd() -> Result<()> {
    let twse = StubSource::quoting(
        "twse",
        Quote::new(dec("500.0"), "twse")?.with_currency("TWD"),
    );
    let yahoo = StubSource::failing("yahoo");
    let fx = StubFx::new(&[("TWD", "USD", "0.031")]);

    let resolver = PriceResolver::new(converter(&fx)).with_tw_equity_chain(chain([&twse, &yahoo]));

    let quote = resolver.resolve(&symbol("2330"), Category::TwStock).await;
    let quote = quote.expect("expected a converted price");

    assert_eq!(quote.price, dec("15.5"));
    assert_eq!(quote.currency, "USD");
    assert_eq!(quote.source, "twse");
    assert_eq!(yahoo.calls(), 0);
    assert_eq!(fx.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn taiwan_price_without_rate_is_absent() -> Result<()> {
    let twse = StubSource::quoting("twse", Quote::new(dec("500"), "twse")?.with_currency("TWD"));
    let fx = StubFx::new(&[]);

    let resolver = PriceResolver::new(converter(&fx)).with_tw_equity_chain(chain([&twse]));

    assert!(resolver.resolve(&symbol("0050"), Category::TwEtf).await.is_none());
    assert_eq!(fx.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn usd_quotes_skip_conversion() -> Result<()> {
    let fx = StubFx::new(&[]);
    let pyth = StubSource::priced("pyth", "2.05");
    let resolver = PriceResolver::new(converter(&fx)).with_crypto_chain(chain([&pyth]));

    let quote = resolver.resolve(&symbol("ARB"), Category::Crypto).await;

    assert_eq!(quote.map(|q| q.price), Some(dec("2.05")));
    assert_eq!(fx.calls(), 0);
    Ok(())
}
