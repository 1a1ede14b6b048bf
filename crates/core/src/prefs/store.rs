//! File-backed preference storage
//!
//! Keeps preferences as a JSON object in a file on disk.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;

/// Key-value storage for local settings
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a key. Returns whether it was present.
    async fn remove(&self, key: &str) -> Result<bool>;
}

/// Preference store persisted as one JSON file
pub struct FilePreferenceStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, Value>>,
}

impl FilePreferenceStore {
    /// Open a store, loading the file if it exists.
    ///
    /// A missing file is created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            let values: Map<String, Value> = serde_json::from_str(&content)?;
            values.into_iter().collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = cache.len(), "Opened preference store");

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Write a snapshot to disk.
    ///
    /// Callers hold the cache write guard, so writes never overlap. The
    /// snapshot goes to a sibling temp file that is renamed over the real one.
    async fn persist(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let cache = self.cache.read().await;
        Ok(cache.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value);
        self.persist(&cache).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut cache = self.cache.write().await;
        let removed = cache.remove(key).is_some();
        if removed {
            self.persist(&cache).await?;
        }
        Ok(removed)
    }
}
