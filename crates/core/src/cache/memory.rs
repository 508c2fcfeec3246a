//! In-process durable tier.
//!
//! Behaves like browser local storage: a flat string map with an optional
//! entry quota. Used where persistence is not needed and throughout the tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::store::DurableStore;
use crate::Error;

/// A `DurableStore` held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses new keys once it holds `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: RwLock::new(BTreeMap::new()), capacity: Some(capacity) }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        if let Some(capacity) = self.capacity
            && !entries.contains_key(key)
            && entries.len() >= capacity
        {
            return Err(Error::StorageFull(format!("memory store holds {} of {capacity} entries", entries.len())));
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
