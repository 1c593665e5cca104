#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pricebook::market_data::{
    AdapterError, Chain, CurrencyConverter, ExchangeRate, FxRateSource, PriceSource, Quote, Symbol,
};
use rust_decimal::Decimal;

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn symbol(value: &str) -> Symbol {
    Symbol::new(value).unwrap()
}

pub fn chain<const N: usize>(sources: [&Arc<StubSource>; N]) -> Chain {
    sources
        .into_iter()
        .map(|source| Arc::clone(source) as Arc<dyn PriceSource>)
        .collect()
}

pub fn converter(fx: &Arc<StubFx>) -> CurrencyConverter {
    CurrencyConverter::new(vec![Arc::clone(fx) as Arc<dyn FxRateSource>])
}

/// Price source returning a fixed answer and counting calls.
pub struct StubSource {
    name: String,
    quote: Option<Quote>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn priced(name: &str, price: &str) -> Arc<Self> {
        Self::quoting(name, Quote::new(dec(price), name).unwrap())
    }

    pub fn quoting(name: &str, quote: Quote) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            quote: Some(quote),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            quote: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StubSource {
    async fn try_fetch(&self, _symbol: &Symbol) -> Result<Quote, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quote.clone().ok_or(AdapterError::Empty)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// FX source with a fixed table of (base, quote) → rate.
pub struct StubFx {
    rates: HashMap<(String, String), Decimal>,
    calls: AtomicUsize,
}

impl StubFx {
    pub fn new(rates: &[(&str, &str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            rates: rates
                .iter()
                .map(|(base, quote, rate)| ((base.to_string(), quote.to_string()), dec(rate)))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FxRateSource for StubFx {
    async fn try_fetch_rate(&self, base: &str, quote: &str) -> Result<ExchangeRate, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rate = self
            .rates
            .get(&(base.to_string(), quote.to_string()))
            .copied()
            .ok_or_else(|| AdapterError::NotFound(format!("{base}/{quote}")))?;
        Ok(ExchangeRate {
            base: base.to_string(),
            quote: quote.to_string(),
            rate,
            source: "stub".to_string(),
        })
    }

    fn name(&self) -> &str {
        "stub_fx"
    }
}
