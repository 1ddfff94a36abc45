//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API endpoint, where saved credentials live, and biometric settings.
//!
//! Configuration is stored at `~/.config/ffbank/config.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "ffbank";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Key-value storage file name (file backend)
const STORAGE_FILE: &str = "storage.json";

/// Bank API used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://mock-bank-mock-back.yexuz7.easypanel.host";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "FFBANK_API_URL";

/// Where saved login data is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Plain JSON file next to the config
    #[default]
    File,
    /// OS keychain
    Keyring,
}

/// When a manual login writes nickname and password to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPersistence {
    /// Every successful manual login
    #[default]
    Always,
    /// Only once the user has opted into biometric unlock
    WhenBiometricEnabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub credential_persistence: CredentialPersistence,
    /// Allow the platform fingerprint reader to be used at all
    pub biometrics_enabled: bool,
    /// Login name passed to fprintd (defaults to `$USER`)
    pub biometric_user: Option<String>,
    pub last_nickname: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            storage_backend: StorageBackend::default(),
            credential_persistence: CredentialPersistence::default(),
            biometrics_enabled: true,
            biometric_user: None,
            last_nickname: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// API base URL: `FFBANK_API_URL`, then config, then the default.
    pub fn api_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Open the configured key-value backend.
    /// Falls back to memory-only storage if no config directory exists.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match self.storage_backend {
            StorageBackend::Keyring => Arc::new(KeyringStore::new()),
            StorageBackend::File => match Self::config_dir() {
                Ok(dir) => Arc::new(FileStore::new(dir.join(STORAGE_FILE))),
                Err(e) => {
                    warn!(error = %e, "No config directory, saved logins will not persist");
                    Arc::new(MemoryStore::new())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.biometrics_enabled);
        assert_eq!(config.storage_backend, StorageBackend::File);
        assert_eq!(config.credential_persistence, CredentialPersistence::Always);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = serde_json::from_str(
            r#"{"storage_backend": "keyring", "credential_persistence": "when_biometric_enabled"}"#,
        )
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Keyring);
        assert_eq!(
            config.credential_persistence,
            CredentialPersistence::WhenBiometricEnabled
        );
        assert!(config.biometrics_enabled);
        assert_eq!(config.api_base_url, None);
    }

    #[test]
    fn test_api_base_url_from_config() {
        // Only meaningful when the override variable is not set in the test environment
        if std::env::var(API_URL_ENV).is_ok() {
            return;
        }
        let config = Config {
            api_base_url: Some("http://localhost:3000/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "http://localhost:3000");
        assert_eq!(Config::default().api_base_url(), DEFAULT_API_BASE_URL);
    }
}
