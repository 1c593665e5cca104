use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::credentials::API_KEY_FILE;
use crate::duration::{deserialize_duration, deserialize_duration_opt};
use crate::market_data::USD;

/// Name of the application config file.
pub const CONFIG_FILE: &str = "pricebook.toml";

fn default_reporting_currency() -> String {
    USD.to_string()
}

fn default_portfolio_file() -> PathBuf {
    PathBuf::from("portfolio.toml")
}

/// `[display]`: how report amounts are rendered. Never affects valuation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Round rendered values to this many places.
    pub currency_decimals: Option<u32>,

    /// Insert `,` between thousands.
    pub currency_grouping: bool,

    /// Prefix such as "$".
    pub currency_symbol: Option<String>,

    /// Pad to exactly `currency_decimals` places.
    pub currency_fixed_decimals: bool,
}

/// Default per-request timeout (5 seconds).
fn default_http_timeout() -> Duration {
    Duration::from_secs(5)
}

/// HTTP settings shared by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for a single provider request. Each provider gets one attempt.
    #[serde(
        default = "default_http_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
        }
    }
}

/// Oracle feed-id cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCacheConfig {
    /// How long a resolved feed id is trusted. Unset means for the whole run.
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub ttl: Option<Duration>,
}

/// Base URL overrides, for mirrors and tests. Unset uses the public endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub pyth: Option<String>,
    pub redstone: Option<String>,
    pub binance: Option<String>,
    pub alpha_vantage: Option<String>,
    pub yahoo: Option<String>,
    pub twse: Option<String>,
    pub exchange_rate: Option<String>,
}

/// Contents of `pricebook.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the portfolio and `api_key.toml`. Relative paths are
    /// taken from the config file's directory, which is also the default.
    pub data_dir: Option<PathBuf>,

    /// Portfolio file, relative to the data directory unless absolute.
    #[serde(default = "default_portfolio_file")]
    pub portfolio_file: PathBuf,

    /// Currency the total is also shown in, e.g. "TWD".
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub feed_cache: FeedCacheConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            portfolio_file: default_portfolio_file(),
            reporting_currency: default_reporting_currency(),
            display: DisplayConfig::default(),
            http: HttpConfig::default(),
            feed_cache: FeedCacheConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    fn resolve(self, config_dir: &Path) -> ResolvedConfig {
        let data_dir = self.resolve_data_dir(config_dir);
        let portfolio_path = if self.portfolio_file.is_absolute() {
            self.portfolio_file
        } else {
            data_dir.join(self.portfolio_file)
        };

        ResolvedConfig {
            api_key_path: data_dir.join(API_KEY_FILE),
            data_dir,
            portfolio_path,
            reporting_currency: self.reporting_currency.trim().to_uppercase(),
            display: self.display,
            http: self.http,
            feed_cache: self.feed_cache,
            providers: self.providers,
        }
    }
}

/// [`Config`] with every path made absolute.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,

    pub portfolio_path: PathBuf,

    /// Location of `api_key.toml` (may not exist).
    pub api_key_path: PathBuf,

    /// Upper-cased reporting currency.
    pub reporting_currency: String,

    pub display: DisplayConfig,
    pub http: HttpConfig,
    pub feed_cache: FeedCacheConfig,
    pub providers: ProvidersConfig,
}

/// `./pricebook.toml` when present, else `pricebook/pricebook.toml` under the
/// platform config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    match dirs::config_dir() {
        Some(dir) if !local.exists() => dir.join("pricebook").join(CONFIG_FILE),
        _ => local,
    }
}

impl ResolvedConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        Ok(Config::load(&config_path)?.resolve(config_dir))
    }

    /// Like [`ResolvedConfig::load`], but a missing file means defaults rooted
    /// at the directory the file would live in.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Config::default().resolve(config_dir))
    }
}
