//! Key-value storage primitive
//!
//! The recipe collection is stored as one opaque string value under a single
//! key. Backends only need to get, set and remove whole values; there is no
//! per-record addressing at this layer.

use async_trait::async_trait;

use super::error::StorageResult;

/// Asynchronous string key → string value storage
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// Returns `Ok(None)` if nothing has been stored under the key yet.
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    ///
    /// A failed write must leave the previous value readable.
    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the value stored under `key`; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Short backend name for logs and status output
    fn name(&self) -> &str;

    /// Size in bytes of the value under `key`, if the backend can tell cheaply
    async fn item_size(&self, key: &str) -> StorageResult<Option<u64>> {
        Ok(self.get_item(key).await?.map(|value| value.len() as u64))
    }
}
