use ::keyring::Entry;
use async_trait::async_trait;

use super::{KeyValueStorage, StorageError, StorageResult};

/// Keychain service name used when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "gobarber";

/// Storage in the OS keychain, one credential per key.
///
/// Batches are applied key by key; the keychain offers no transaction.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Run a keychain call on the blocking pool. The platform keychain APIs
    /// are synchronous and may wait on an unlock prompt.
    async fn with_entry<T, F>(&self, key: &str, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> StorageResult<T> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || f(Entry::new(&service, &key)?))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

#[async_trait]
impl KeyValueStorage for KeyringStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let value = value.to_string();
        self.with_entry(key, move |entry| Ok(entry.set_password(&value)?))
            .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
        .await
    }
}
