//! `api_key.toml`: a flat table of key name → key string.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::CredentialStore;

/// API keys read from a TOML file.
pub struct ApiKeyFile {
    keys: HashMap<String, SecretString>,
}

impl ApiKeyFile {
    /// Load keys from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API key file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse API key file: {}", path.display()))
    }

    /// Load keys from a file, returning None if file doesn't exist.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: HashMap<String, String> = toml::from_str(content)?;
        let keys = raw
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(name, value)| (name, SecretString::from(value.trim().to_string())))
            .collect();
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl CredentialStore for ApiKeyFile {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        Ok(self
            .keys
            .get(key)
            .map(|v| SecretString::from(v.expose_secret().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_key_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
alpha_vantage_api_key = "demo"
exchangerate_api_key = "  fx-key  "
"#
        )?;

        let keys = ApiKeyFile::load(file.path())?;
        assert_eq!(keys.len(), 2);

        let fx = keys.get("exchangerate_api_key").await?;
        assert_eq!(fx.as_ref().map(|s| s.expose_secret()), Some("fx-key"));

        Ok(())
    }

    #[test]
    fn test_blank_values_are_absent() -> Result<()> {
        let keys = ApiKeyFile::from_toml_str("alpha_vantage_api_key = \"\"")?;
        assert!(keys.is_empty());
        Ok(())
    }

    #[test]
    fn test_non_string_values_are_rejected() {
        assert!(ApiKeyFile::from_toml_str("alpha_vantage_api_key = 42").is_err());
    }

    #[test]
    fn test_load_optional_missing_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        assert!(ApiKeyFile::load_optional(&dir.path().join("api_key.toml"))?.is_none());
        Ok(())
    }
}
