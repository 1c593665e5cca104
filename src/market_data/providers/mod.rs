pub mod alpha_vantage;
pub mod binance;
pub mod exchange_rate;
pub mod pyth;
pub mod redstone;
pub mod twse;
pub mod yahoo;

pub use alpha_vantage::AlphaVantagePriceSource;
pub use binance::BinancePriceSource;
pub use exchange_rate::ExchangeRateSource;
pub use pyth::{PythFeedResolver, PythPriceSource};
pub use redstone::RedstonePriceSource;
pub use twse::TwsePriceSource;
pub use yahoo::YahooPriceSource;
