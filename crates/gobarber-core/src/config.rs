//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API location, the session storage backend and the
//! last email used to sign in.
//!
//! Configuration is stored at `~/.config/gobarber/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::storage::{
    FileStorage, KeyValueStorage, KeyringStorage, StorageKeys, DEFAULT_NAMESPACE,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "gobarber";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured API URL
pub const API_URL_ENV: &str = "GOBARBER_API_URL";

/// Where the session is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub namespace: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply an API URL from the environment, if one is set and non-empty
    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url);
        }
        self
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::new(self.namespace())
    }

    /// Open the configured session storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(&self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new(APP_NAME)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), "http://localhost:3333");
        assert_eq!(config.namespace(), "@GoBarber");
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.storage_keys().token, "@GoBarber:token");
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default().with_api_url_override(Some("https://api.example.com".to_string()));
        assert_eq!(config.api_url(), "https://api.example.com");

        let config = Config::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_url(), "http://localhost:3333");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            api_url: Some("https://api.example.com".to_string()),
            storage: StorageBackend::Keyring,
            namespace: Some("@Staging".to_string()),
            last_email: Some("a@b.com".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url(), "https://api.example.com");
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert_eq!(loaded.storage_keys().user, "@Staging:user");
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_load_missing_and_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(missing.api_url.is_none());

        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"storage":"keyring"}"#).unwrap();
        let partial = Config::load_from(&path).unwrap();
        assert_eq!(partial.storage, StorageBackend::Keyring);
        assert!(partial.last_email.is_none());
    }
}
