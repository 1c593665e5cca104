//! Credential storage abstraction.
//!
//! Providers that need an API key ask a [`CredentialStore`] for it by name.
//! Keys normally live in `api_key.toml` next to the portfolio:
//!
//! ```toml
//! alpha_vantage_api_key = "..."
//! exchangerate_api_key = "..."
//! ```
//!
//! and can be overridden per key with `PRICEBOOK_<NAME>` environment variables.

mod config;
mod env;

pub use config::ApiKeyFile;
pub use env::EnvCredentialStore;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;

/// Key name for the Alpha Vantage API key.
pub const ALPHA_VANTAGE_KEY: &str = "alpha_vantage_api_key";

/// Key name for the ExchangeRate-API key.
pub const EXCHANGE_RATE_KEY: &str = "exchangerate_api_key";

/// File name of the key file inside the data directory.
pub const API_KEY_FILE: &str = "api_key.toml";

/// A read-only key-value store for credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Retrieve a credential by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    /// Returns `Err` if there was an error accessing the backend.
    async fn get(&self, key: &str) -> Result<Option<SecretString>>;
}

/// Stores consulted in order; the first one holding a key wins.
#[derive(Default)]
pub struct LayeredCredentialStore {
    layers: Vec<Box<dyn CredentialStore>>,
}

impl LayeredCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, store: impl CredentialStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }

    /// Environment overrides on top of the data directory's key file (if any).
    pub fn for_data_dir(data_dir: &std::path::Path) -> Result<Self> {
        let mut store = Self::new().with_layer(EnvCredentialStore::new());
        if let Some(file) = ApiKeyFile::load_optional(&data_dir.join(API_KEY_FILE))? {
            store = store.with_layer(file);
        }
        Ok(store)
    }
}

#[async_trait]
impl CredentialStore for LayeredCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        for layer in &self.layers {
            if let Some(value) = layer.get(key).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn earlier_layers_win() -> Result<()> {
        let first = ApiKeyFile::from_toml_str("alpha_vantage_api_key = \"first\"")?;
        let second = ApiKeyFile::from_toml_str(
            "alpha_vantage_api_key = \"second\"\nexchangerate_api_key = \"fx\"",
        )?;
        let store = LayeredCredentialStore::new()
            .with_layer(first)
            .with_layer(second);

        let alpha = store.get(ALPHA_VANTAGE_KEY).await?;
        assert_eq!(alpha.as_ref().map(|s| s.expose_secret()), Some("first"));

        let fx = store.get(EXCHANGE_RATE_KEY).await?;
        assert_eq!(fx.as_ref().map(|s| s.expose_secret()), Some("fx"));

        assert!(store.get("missing").await?.is_none());
        Ok(())
    }
}
