//! Durable local key-value store backing autosave and version history.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace stored value: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// String values under fixed keys. Implementations must never expose a
/// partially written value.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a data directory. Writes go to a temp
/// file in the same directory and are renamed over the target.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();
        let bytes = value.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path)?;
            Ok(())
        })
        .await??;
        debug!("Stored key '{key}' ({} bytes)", value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_put_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path().join("data")).await.unwrap();

        assert_eq!(store.get("resume-data").await.unwrap(), None);
        store.put("resume-data", "{\"a\":1}").await.unwrap();
        store.put("resume-data", "{\"a\":2}").await.unwrap();
        assert_eq!(
            store.get("resume-data").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert!(dir.path().join("data/resume-data.json").exists());

        store.remove("resume-data").await.unwrap();
        store.remove("resume-data").await.unwrap();
        assert_eq!(store.get("resume-data").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.put("../escape", "x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
