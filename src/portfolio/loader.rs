// src/portfolio/loader.rs
//! Loading `portfolio.toml`.
//!
//! ```toml
//! [crypto]
//! ETH = 1.5
//!
//! [tw-etf]
//! "0050" = 1000
//!
//! [cash]
//! TWD = 25000
//! ```

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use toml::{Table, Value};

use super::{CashBalance, Holding, Portfolio};
use crate::market_data::{Category, EmptySymbol, Symbol, UnknownCategory};

/// Section names holding cash balances rather than priced assets.
const CASH_SECTIONS: [&str; 2] = ["cash", "forex"];

#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("invalid portfolio TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),

    #[error("[{section}] must be a table of symbol = amount")]
    NotATable { section: String },

    #[error("[{section}] contains an empty symbol")]
    EmptySymbol { section: String },

    #[error("[{section}] {key}: invalid amount {value}")]
    InvalidAmount {
        section: String,
        key: String,
        value: String,
    },
}

impl Portfolio {
    /// Load a portfolio file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read portfolio file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse portfolio file: {}", path.display()))
    }

    /// Parse portfolio TOML.
    ///
    /// Every top-level table must be a category name or a cash section; any
    /// other name fails with [`PortfolioError::UnknownCategory`].
    pub fn from_toml_str(content: &str) -> Result<Self, PortfolioError> {
        let table: Table = toml::from_str(content)?;
        let mut portfolio = Portfolio::default();

        for (section, value) in &table {
            let entries = value.as_table().ok_or_else(|| PortfolioError::NotATable {
                section: section.clone(),
            })?;

            if CASH_SECTIONS.contains(&section.to_lowercase().as_str()) {
                for (currency, amount) in entries {
                    let currency = currency.trim().to_uppercase();
                    if currency.is_empty() {
                        return Err(PortfolioError::EmptySymbol {
                            section: section.clone(),
                        });
                    }
                    portfolio.cash.push(CashBalance {
                        amount: parse_amount(section, &currency, amount)?,
                        currency,
                    });
                }
                continue;
            }

            let category = Category::from_str(section)?;
            for (symbol, amount) in entries {
                let symbol = Symbol::new(symbol).map_err(|EmptySymbol| PortfolioError::EmptySymbol {
                    section: section.clone(),
                })?;
                portfolio.holdings.push(Holding {
                    amount: parse_amount(section, symbol.as_str(), amount)?,
                    symbol,
                    category,
                });
            }
        }

        portfolio
            .holdings
            .sort_by(|a, b| (a.category, &a.symbol).cmp(&(b.category, &b.symbol)));
        portfolio.cash.sort_by(|a, b| a.currency.cmp(&b.currency));

        Ok(portfolio)
    }
}

fn parse_amount(section: &str, key: &str, value: &Value) -> Result<Decimal, PortfolioError> {
    let amount = match value {
        Value::Integer(n) => Some(Decimal::from(*n)),
        Value::Float(f) if f.is_finite() => Decimal::from_f64(*f),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    amount.ok_or_else(|| PortfolioError::InvalidAmount {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[crypto]
eth = 1.5
BTC = 0.25

[US-Stock]
AMD = 10

[tw-etf]
"0050" = "1000"

[cash]
twd = 25000
USD = 120.5
"#;

    #[test]
    fn parses_sections_in_category_order() {
        let portfolio = Portfolio::from_toml_str(SAMPLE).unwrap();

        let order: Vec<(Category, &str)> = portfolio
            .holdings
            .iter()
            .map(|h| (h.category, h.symbol.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Category::Crypto, "BTC"),
                (Category::Crypto, "ETH"),
                (Category::UsStock, "AMD"),
                (Category::TwEtf, "0050"),
            ]
        );
        assert_eq!(portfolio.holdings[1].amount, Decimal::from_str("1.5").unwrap());
        assert_eq!(portfolio.holdings[3].amount, Decimal::from(1000));
    }

    #[test]
    fn parses_cash_balances() {
        let portfolio = Portfolio::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            portfolio.cash,
            vec![
                CashBalance {
                    currency: "TWD".to_string(),
                    amount: Decimal::from(25000),
                },
                CashBalance {
                    currency: "USD".to_string(),
                    amount: Decimal::from_str("120.5").unwrap(),
                },
            ]
        );
    }

    #[test]
    fn forex_is_an_alias_for_cash() {
        let portfolio = Portfolio::from_toml_str("[forex]\nJPY = 1000\n").unwrap();
        assert_eq!(portfolio.cash[0].currency, "JPY");
        assert!(portfolio.holdings.is_empty());
    }

    #[test]
    fn unknown_section_is_unknown_category() {
        let err = Portfolio::from_toml_str("[bonds]\nTLT = 3\n").unwrap_err();
        assert!(matches!(err, PortfolioError::UnknownCategory(UnknownCategory(ref name)) if name == "bonds"));
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let err = Portfolio::from_toml_str("[crypto]\nETH = true\n").unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidAmount { ref key, .. } if key == "ETH"));

        let err = Portfolio::from_toml_str("[crypto]\nETH = \"lots\"\n").unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidAmount { .. }));
    }

    #[test]
    fn rejects_scalar_sections() {
        let err = Portfolio::from_toml_str("crypto = 3\n").unwrap_err();
        assert!(matches!(err, PortfolioError::NotATable { .. }));
    }
}
