//! Durable key-value storage for session data.
//!
//! This module provides:
//! - `KeyValueStorage`: The async storage trait the session store persists through
//! - `FileStorage`: A JSON file in the app data directory with atomic batches
//! - `KeyringStorage`: OS keychain entries via keyring
//! - `MemoryStorage`: An in-process map for tests and ephemeral sessions
//!
//! Session entries live under a namespace, see `StorageKeys`.

pub mod file;
pub mod keyring;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use self::file::FileStorage;
pub use self::keyring::KeyringStorage;
pub use self::memory::MemoryStorage;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "@GoBarber";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] ::keyring::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent, app-scoped string key-value store.
///
/// The `multi_*` operations are the batched forms used by the session store.
/// Backends that can apply a batch atomically override them.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Values are returned in the order of `keys`.
    async fn multi_get(&self, keys: &[&str]) -> StorageResult<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn multi_set(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// The two keys a persisted session occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub user: String,
    pub token: String,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            user: format!("{}:user", namespace),
            token: format!("{}:token", namespace),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
