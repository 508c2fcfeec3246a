//! The durable key-value tier.

use async_trait::async_trait;

use crate::Error;

/// A string key-value store that survives process restarts.
///
/// `set` must fail with [`Error::StorageFull`] when the store is out of
/// capacity; the cache reacts to that by evicting its oldest entries and
/// retrying once. Any other error is treated as a degraded tier.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;

    async fn list_keys(&self) -> Result<Vec<String>, Error>;
}
