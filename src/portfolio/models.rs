// src/portfolio/models.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market_data::{Category, Symbol};

/// An amount of one asset, as listed in the portfolio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub category: Category,
    pub amount: Decimal,
}

/// Money held directly in some currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashBalance {
    /// ISO currency code, upper-cased.
    pub currency: String,
    pub amount: Decimal,
}

/// Read-only valuation input.
///
/// Holdings are ordered by category (in [`Category::ALL`] order) and then by
/// symbol; cash balances by currency code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
    pub cash: Vec<CashBalance>,
}

impl Portfolio {
    pub fn holdings_in(&self, category: Category) -> impl Iterator<Item = &Holding> {
        self.holdings
            .iter()
            .filter(move |holding| holding.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty() && self.cash.is_empty()
    }
}
