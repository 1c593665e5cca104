mod builder;
mod converter;
mod error;
mod feed_cache;
pub(crate) mod http;
mod models;
pub mod providers;
mod resolver;
mod sources;
mod valuation;

pub use builder::PriceResolverBuilder;
pub use converter::CurrencyConverter;
pub use error::{AdapterError, EmptySymbol, ResolveError, UnknownCategory};
pub use feed_cache::FeedIdCache;
pub use http::{build_client, DEFAULT_TIMEOUT};
pub use models::{Category, ExchangeRate, FeedId, Quote, Symbol, USD};
pub use resolver::{Chain, PriceResolver};
pub use sources::{FxRateSource, PriceSource};
pub use valuation::{CashLine, HoldingLine, PortfolioValuator, ValuationReport};
