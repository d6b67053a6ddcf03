//! Durable storage for the selection
//!
//! Storage is a flat key-value store of JSON blobs. Each write replaces the whole
//! blob for its key; there are no transactions beyond that.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::Product;

use super::{Selection, Toggled};

/// Storage key holding the selection as a JSON array of products
pub const SELECTION_KEY: &str = "selectedProducts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key-value storage for string blobs
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let final_path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));
        tokio::fs::write(&tmp_path, value).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }
}

/// Process-local storage, optionally with a size limit on stored values
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: tokio::sync::Mutex<std::collections::HashMap<String, String>>,
    quota: Option<usize>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose value is larger than `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Default::default(),
            quota: Some(bytes),
        }
    }

    /// Seed a raw value, bypassing the quota
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(std::io::Error::other("storage quota exceeded").into());
            }
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Selection with best-effort persistence.
///
/// The in-memory selection is authoritative for the session; storage failures are
/// logged and never roll back a mutation.
pub struct SelectionStore {
    storage: Arc<dyn KeyValueStorage>,
    selection: Selection,
}

impl SelectionStore {
    /// Restore the persisted selection, falling back to empty on any failure
    pub async fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let selection = match Self::read(storage.as_ref()).await {
            Ok(Some(selection)) => {
                tracing::debug!("Restored {} selected product(s)", selection.len());
                selection
            }
            Ok(None) => Selection::new(),
            Err(e) => {
                tracing::warn!("Failed to load selected products, starting empty: {}", e);
                Selection::new()
            }
        };

        Self { storage, selection }
    }

    async fn read(storage: &dyn KeyValueStorage) -> Result<Option<Selection>, StorageError> {
        let Some(raw) = storage.get(SELECTION_KEY).await? else {
            return Ok(None);
        };
        let products: Vec<Product> = serde_json::from_str(&raw)?;
        Ok(Some(Selection::from_products(products)))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub async fn toggle(&mut self, product: &Product) -> Toggled {
        let toggled = self.selection.toggle(product);
        tracing::debug!("{:?} product {} ({})", toggled, product.id, product.name);
        self.save().await;
        toggled
    }

    /// Empty the selection; callers are responsible for obtaining confirmation
    pub async fn clear(&mut self) {
        self.selection.clear();
        self.save().await;
    }

    /// Persist the current selection, logging on failure
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            tracing::warn!("Failed to save selected products: {}", e);
        }
    }

    pub async fn try_save(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.selection)?;
        self.storage.set(SELECTION_KEY, &raw).await
    }
}
