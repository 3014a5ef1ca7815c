//! File-backed storage
//!
//! Each key is stored as `<data_dir>/<key>.json`. Writes are atomic: the
//! value goes to a temporary file, is synced, then renamed over the target,
//! so a reader never sees a partially-written collection.
//!
//! Storage location: `~/.local/share/recipebox/` (configurable via `Config`)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::backend::KeyValueStorage;
use super::error::{StorageError, StorageResult};
use crate::config::Config;

/// Storage backend writing one file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a backend rooted at `dir`
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a backend rooted at the configured data directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir)
    }

    /// Directory holding the stored files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(key, bytes = bytes.len(), "read stored value");
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|source| StorageError::InvalidUtf8 { path, source })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read_io(e, path)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes()).await?;
        debug!(key, bytes = value.len(), "wrote stored value");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_write_io(e, path)),
        }
    }

    fn name(&self) -> &str {
        "file"
    }

    async fn item_size(&self, key: &str) -> StorageResult<Option<u64>> {
        let path = self.path_for(key)?;

        match fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read_io(e, path)),
        }
    }
}

/// Keys become file names, so only a conservative character set is allowed
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .await
        .map_err(|e| StorageError::from_write_io(e, temp_path.clone()))?;

    file.write_all(data)
        .await
        .map_err(|e| StorageError::from_write_io(e, temp_path.clone()))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::from_write_io(e, temp_path.clone()))?;
    drop(file);

    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::AtomicWriteFailed {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.get_item("recipes").await.unwrap().is_none());
        assert!(storage.item_size("recipes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set_item("recipes", "[]").await.unwrap();
        assert_eq!(storage.get_item("recipes").await.unwrap().as_deref(), Some("[]"));
        assert!(temp_dir.path().join("recipes.json").exists());
        assert_eq!(storage.item_size("recipes").await.unwrap(), Some(2));

        // Overwrite replaces the whole value
        storage.set_item("recipes", "[1]").await.unwrap();
        assert_eq!(storage.get_item("recipes").await.unwrap().as_deref(), Some("[1]"));

        // No temp file left behind
        assert!(!temp_dir.path().join("recipes.tmp").exists());
    }

    #[tokio::test]
    async fn test_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let storage = FileStorage::new(&nested);

        storage.set_item("recipes", "[]").await.unwrap();
        assert!(nested.join("recipes.json").exists());
    }

    #[tokio::test]
    async fn test_remove_item() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set_item("recipes", "[]").await.unwrap();
        storage.remove_item("recipes").await.unwrap();
        assert!(storage.get_item("recipes").await.unwrap().is_none());

        // Removing again is fine
        storage.remove_item("recipes").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = storage.set_item(key, "[]").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {:?}", key);
        }
    }

    #[tokio::test]
    async fn test_non_utf8_value_is_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("recipes.json"), [0xff, 0xfe, b'[', b']']).unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let err = storage.get_item("recipes").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("recipes").is_ok());
        assert!(validate_key("dinners-2024.v1").is_ok());
        assert!(validate_key("../x").is_err());
        assert!(validate_key("").is_err());
    }

    #[tokio::test]
    async fn test_read_directory_as_value_fails() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("recipes.json")).unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.get_item("recipes").await.is_err());
    }
}
