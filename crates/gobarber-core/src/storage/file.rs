use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError, StorageResult};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Key-value storage backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and an
/// atomic rename, so a batch either lands completely or not at all.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage at `<data_dir>/storage.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(STORAGE_FILE))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to start a write from. An unparseable file is discarded so
    /// the write replaces it instead of failing forever.
    async fn load_for_write(&self) -> StorageResult<(BTreeMap<String, String>, bool)> {
        match self.load().await {
            Ok(entries) => Ok((entries, false)),
            Err(StorageError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "Storage file is corrupt, starting over");
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "Storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.multi_set(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.multi_remove(&[key]).await
    }

    async fn multi_get(&self, keys: &[&str]) -> StorageResult<Vec<Option<String>>> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    async fn multi_set(&self, batch: &[(&str, &str)]) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load_for_write().await?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.to_string());
        }
        self.save(&entries).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, corrupt) = self.load_for_write().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !corrupt {
            return Ok(());
        }
        self.save(&entries).await
    }
}
