use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::normalize_upper;
use super::{Category, PriceResolver, Symbol, USD};
use crate::clock::{Clock, SystemClock};
use crate::portfolio::{CashBalance, Holding, Portfolio};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingLine {
    pub symbol: Symbol,
    pub category: Category,
    pub amount: Decimal,
    /// USD price. None if no provider had one.
    pub price: Option<Decimal>,
    /// `amount * price` in USD. None when `price` is None or the product
    /// overflows.
    pub value: Option<Decimal>,
    /// Provider that supplied the price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashLine {
    pub currency: String,
    pub amount: Decimal,
    /// USD value. None if no exchange rate was available.
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub as_of: DateTime<Utc>,
    pub holdings: Vec<HoldingLine>,
    pub cash: Vec<CashLine>,
    /// Sum of every known line value, in USD.
    pub total_usd: Decimal,
    /// Lines (holdings and cash) left out of the total.
    pub missing: usize,
    pub reporting_currency: String,
    /// `total_usd` in the reporting currency. None if it couldn't be converted.
    pub reporting_total: Option<Decimal>,
}

impl ValuationReport {
    pub fn is_complete(&self) -> bool {
        self.missing == 0
    }

    pub fn missing_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.holdings
            .iter()
            .filter(|line| line.value.is_none())
            .map(|line| &line.symbol)
    }
}

/// Values a [`Portfolio`] one line at a time.
pub struct PortfolioValuator {
    resolver: Arc<PriceResolver>,
    clock: Arc<dyn Clock>,
    reporting_currency: String,
}

impl PortfolioValuator {
    pub fn new(resolver: Arc<PriceResolver>) -> Self {
        Self {
            resolver,
            clock: Arc::new(SystemClock),
            reporting_currency: USD.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporting_currency(mut self, currency: &str) -> Self {
        self.reporting_currency = normalize_upper(currency);
        self
    }

    pub async fn value(&self, portfolio: &Portfolio) -> ValuationReport {
        let as_of = self.clock.now();
        let mut holdings = Vec::with_capacity(portfolio.holdings.len());
        let mut cash = Vec::with_capacity(portfolio.cash.len());

        for category in Category::ALL {
            for holding in portfolio.holdings_in(category) {
                holdings.push(self.value_holding(holding).await);
            }
        }

        for balance in &portfolio.cash {
            cash.push(self.value_cash(balance).await);
        }

        let known = holdings
            .iter()
            .map(|line| line.value)
            .chain(cash.iter().map(|line| line.value));
        let mut total_usd = Decimal::ZERO;
        let mut missing = 0;
        for value in known {
            match value {
                Some(value) => total_usd += value,
                None => missing += 1,
            }
        }

        let reporting_total = self
            .resolver
            .converter()
            .convert(total_usd, USD, &self.reporting_currency)
            .await;

        if missing > 0 {
            tracing::warn!(missing, "valuation is missing prices; total excludes them");
        }

        ValuationReport {
            as_of,
            holdings,
            cash,
            total_usd,
            missing,
            reporting_currency: self.reporting_currency.clone(),
            reporting_total,
        }
    }

    async fn value_holding(&self, holding: &Holding) -> HoldingLine {
        let quote = self.resolver.resolve(&holding.symbol, holding.category).await;
        let price = quote.as_ref().map(|quote| quote.price);
        let value = price.and_then(|price| {
            let value = holding.amount.checked_mul(price);
            if value.is_none() {
                tracing::warn!(
                    symbol = %holding.symbol,
                    amount = %holding.amount,
                    price = %price,
                    "holding value overflows; counted as missing"
                );
            }
            value
        });

        HoldingLine {
            symbol: holding.symbol.clone(),
            category: holding.category,
            amount: holding.amount,
            price,
            value,
            source: quote.map(|quote| quote.source),
        }
    }

    async fn value_cash(&self, balance: &CashBalance) -> CashLine {
        let value = self
            .resolver
            .converter()
            .convert(balance.amount, &balance.currency, USD)
            .await;

        CashLine {
            currency: balance.currency.clone(),
            amount: balance.amount,
            value,
        }
    }
}
