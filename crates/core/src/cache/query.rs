//! The query cache engine.
//!
//! Reads go memory tier → durable tier → data source. Only first pages
//! (no cursor) are cached; deeper pages always go upstream so the number of
//! cache keys stays bounded by the number of distinct queries.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::entry::CacheEntry;
use super::hash::compute_cache_key;
use super::stats::{CacheStats, Counters};
use super::store::DurableStore;
use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::query::{Page, QueryOptions, clamp_read};
use crate::source::{DataSource, DataSourceError, PageRequest};

/// Key accepted by [`QueryCache::invalidate`] to clear every entry.
pub const INVALIDATE_ALL: &str = "*";

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct QueryCacheConfig {
    /// TTL used by `CachePolicy::from_config`.
    pub default_ttl: Duration,
    /// Interval for the background expiry sweep.
    pub sweep_interval: Duration,
    /// Share (1-100) of durable entries dropped, oldest first, when the store is full.
    pub eviction_percent: u8,
    /// Namespace for this cache's keys in the durable store.
    pub key_prefix: String,
    /// Deadline for a single data source call.
    pub source_timeout: Option<Duration>,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600), // 1 hour
            sweep_interval: Duration::from_secs(60),
            eviction_percent: 50,
            key_prefix: "qcache:".to_string(),
            source_timeout: None,
        }
    }
}

impl QueryCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_eviction_percent(mut self, percent: u8) -> Self {
        self.eviction_percent = percent.clamp(1, 100);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_source_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.source_timeout = timeout;
        self
    }
}

impl From<&AppConfig> for QueryCacheConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_ttl: config.default_ttl(),
            sweep_interval: config.sweep_interval(),
            eviction_percent: config.eviction_percent.clamp(1, 100),
            key_prefix: config.key_prefix.clone(),
            source_timeout: Some(config.source_timeout()),
        }
    }
}

/// Per-call caching behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// When false the call neither reads nor writes the cache.
    pub use_cache: bool,
    /// Validity window for an entry written by this call.
    pub ttl: Duration,
    /// Skip the lookup but still write the fresh page through.
    pub force_refresh: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { use_cache: true, ttl: Duration::from_secs(3600), force_refresh: false }
    }
}

impl CachePolicy {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, ..Self::default() }
    }

    pub fn from_config(config: &QueryCacheConfig) -> Self {
        Self::with_ttl(config.default_ttl)
    }

    pub fn bypass() -> Self {
        Self { use_cache: false, ..Self::default() }
    }

    pub fn refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// A TTL-bounded, two-tier cache over a paginated data source.
pub struct QueryCache {
    source: Arc<dyn DataSource>,
    durable: Arc<dyn DurableStore>,
    pub(super) memory: Arc<RwLock<HashMap<String, CacheEntry>>>,
    pub(super) clock: Arc<dyn Clock>,
    config: QueryCacheConfig,
    counters: Counters,
}

impl QueryCache {
    pub fn new(source: Arc<dyn DataSource>, durable: Arc<dyn DurableStore>, config: QueryCacheConfig) -> Self {
        Self {
            source,
            durable,
            memory: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(SystemClock),
            config,
            counters: Counters::default(),
        }
    }

    /// Replace the wall clock used for timestamps and TTL checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &QueryCacheConfig {
        &self.config
    }

    /// Bound a requested page size to `[1, MAX_PAGE_SIZE]`.
    pub fn clamp_read(&self, raw_page_size: usize) -> usize {
        clamp_read(raw_page_size)
    }

    /// The key a first-page read of `options` is cached under.
    pub fn cache_key(&self, collection_path: &str, options: &QueryOptions) -> String {
        compute_cache_key(collection_path, clamp_read(options.page_size), options)
    }

    /// Read one page of `collection_path`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidOptions` for malformed options, before any I/O
    /// - `Error::DataSource` when the upstream read fails; the cache is left untouched
    ///
    /// Durable-tier failures never surface here.
    pub async fn fetch_paginated(
        &self, collection_path: &str, options: &QueryOptions, policy: &CachePolicy,
    ) -> Result<Page, Error> {
        if collection_path.trim().is_empty() {
            return Err(Error::InvalidOptions("collection path must not be empty".into()));
        }
        options.validate()?;

        let page_size = clamp_read(options.page_size);
        if page_size != options.page_size {
            Counters::bump(&self.counters.clamp_events);
            tracing::debug!(
                collection = collection_path,
                requested = options.page_size,
                clamped = page_size,
                "page size clamped"
            );
        }

        if !policy.use_cache || options.cursor.is_some() {
            tracing::debug!(collection = collection_path, "cache bypassed");
            return self.fetch_from_source(collection_path, options, page_size).await;
        }

        let key = compute_cache_key(collection_path, page_size, options);

        if !policy.force_refresh
            && let Some(page) = self.lookup(&key, policy.ttl).await
        {
            return Ok(page);
        }

        Counters::bump(&self.counters.misses);
        let page = self.fetch_from_source(collection_path, options, page_size).await?;
        self.write_through(&key, collection_path, &page, policy.ttl).await;

        Ok(page)
    }

    /// Remove one entry from both tiers, or every entry when `key` is `"*"`.
    ///
    /// Invalidating a key that is not cached is a no-op.
    pub async fn invalidate(&self, key: &str) -> Result<(), Error> {
        if key == INVALIDATE_ALL {
            self.memory.write().await.clear();
            for storage_key in self.own_durable_keys().await? {
                self.durable.remove(&storage_key).await?;
            }
            tracing::debug!("cache cleared");
            return Ok(());
        }

        self.memory.write().await.remove(key);
        self.durable.remove(&self.storage_key(key)).await?;
        Ok(())
    }

    /// Remove every entry recorded for `collection_path` from both tiers.
    ///
    /// Returns the number of distinct keys removed.
    pub async fn invalidate_collection(&self, collection_path: &str) -> Result<usize, Error> {
        let mut removed = HashSet::new();

        self.memory.write().await.retain(|key, entry| {
            if entry.collection_path == collection_path {
                removed.insert(key.clone());
                false
            } else {
                true
            }
        });

        for storage_key in self.own_durable_keys().await? {
            let Some(raw) = self.durable.get(&storage_key).await? else {
                continue;
            };
            if let Ok(entry) = CacheEntry::decode(&raw)
                && entry.collection_path == collection_path
            {
                self.durable.remove(&storage_key).await?;
                removed.insert(entry.key);
            }
        }

        tracing::debug!(collection = collection_path, removed = removed.len(), "collection invalidated");
        Ok(removed.len())
    }

    /// Scan the durable tier and drop stale or unreadable entries.
    ///
    /// Lookups already ignore stale durable entries; this only reclaims space.
    pub async fn purge_expired_durable(&self) -> Result<usize, Error> {
        let now = self.clock.now();
        let mut removed = 0;

        for storage_key in self.own_durable_keys().await? {
            let Some(raw) = self.durable.get(&storage_key).await? else {
                continue;
            };
            let keep = CacheEntry::decode(&raw).is_ok_and(|entry| entry.is_valid_at(now));
            if !keep {
                self.durable.remove(&storage_key).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Entry counts per tier plus hit/miss counters.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        let memory_entry_count = self.memory.read().await.len();
        let durable_entry_count = self.own_durable_keys().await?.len();
        Ok(self.counters.snapshot(memory_entry_count, durable_entry_count))
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    async fn own_durable_keys(&self) -> Result<Vec<String>, Error> {
        let prefix = &self.config.key_prefix;
        Ok(self
            .durable
            .list_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix.as_str()))
            .collect())
    }

    /// Serve `key` from memory, then durable, if it is no older than `max_age`.
    ///
    /// Entries stale under their own TTL are dropped. Entries that are only
    /// too old for this caller stay put; the write-through replaces them.
    async fn lookup(&self, key: &str, max_age: Duration) -> Option<Page> {
        let now = self.clock.now();

        {
            let memory = self.memory.read().await;
            if let Some(entry) = memory.get(key)
                && entry.is_fresh_for(now, max_age)
            {
                Counters::bump(&self.counters.memory_hits);
                tracing::debug!(key, "memory tier hit");
                return Some(entry.payload.clone());
            }
        }

        {
            let mut memory = self.memory.write().await;
            if memory.get(key).is_some_and(|entry| !entry.is_valid_at(now)) {
                memory.remove(key);
            }
        }

        let storage_key = self.storage_key(key);
        let raw = match self.durable.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "durable tier read failed; treating as miss");
                return None;
            }
        };

        match CacheEntry::decode(&raw) {
            Ok(entry) if entry.key == key && entry.is_fresh_for(now, max_age) => {
                Counters::bump(&self.counters.durable_hits);
                tracing::debug!(key, "durable tier hit");
                let page = entry.payload.clone();
                self.memory.write().await.insert(key.to_string(), entry);
                Some(page)
            }
            Ok(entry) if entry.key == key && entry.is_valid_at(now) => {
                tracing::debug!(key, "durable entry older than caller ttl");
                None
            }
            Ok(_) => {
                tracing::debug!(key, "durable entry stale");
                self.remove_durable_quietly(&storage_key).await;
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "durable entry unreadable; removing");
                self.remove_durable_quietly(&storage_key).await;
                None
            }
        }
    }

    async fn remove_durable_quietly(&self, storage_key: &str) {
        if let Err(e) = self.durable.remove(storage_key).await {
            tracing::warn!(key = storage_key, error = %e, "failed to remove durable entry");
        }
    }

    async fn fetch_from_source(
        &self, collection_path: &str, options: &QueryOptions, page_size: usize,
    ) -> Result<Page, Error> {
        let request = PageRequest {
            collection_path,
            limit: page_size + 1,
            cursor: options.cursor.as_ref(),
            order_by: &options.order_by,
            filters: &options.filters,
        };

        Counters::bump(&self.counters.source_fetches);
        tracing::debug!(collection = collection_path, limit = request.limit, "fetching from data source");

        let fetch = self.source.fetch_page(&request);
        let documents = match self.config.source_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(DataSourceError::deadline_exceeded(format!(
                        "no response from data source within {limit:?}"
                    ))
                    .into());
                }
            },
            None => fetch.await?,
        };

        Ok(Page::from_documents(documents, page_size))
    }

    async fn write_through(&self, key: &str, collection_path: &str, page: &Page, ttl: Duration) {
        let entry = CacheEntry::new(key, collection_path, page.clone(), self.clock.now(), ttl);
        let encoded = entry.encode();
        self.memory.write().await.insert(key.to_string(), entry);

        let raw = match encoded {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not encode entry; cached in memory only");
                return;
            }
        };

        let storage_key = self.storage_key(key);
        match self.durable.set(&storage_key, &raw).await {
            Ok(()) => {}
            Err(e) if e.is_storage_full() => {
                tracing::warn!(key, error = %e, "durable tier full; evicting oldest entries");
                if let Err(e) = self.evict_oldest().await {
                    tracing::warn!(error = %e, "eviction pass failed");
                }
                if let Err(e) = self.durable.set(&storage_key, &raw).await {
                    tracing::warn!(key, error = %e, "durable write failed after eviction; cached in memory only");
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "durable write failed; cached in memory only");
            }
        }
    }

    /// Drop the oldest `eviction_percent` of this cache's durable entries.
    ///
    /// Entries that cannot be decoded sort first. Ties on `written_at` break by key.
    async fn evict_oldest(&self) -> Result<usize, Error> {
        let mut aged: Vec<(DateTime<Utc>, String)> = Vec::new();
        for storage_key in self.own_durable_keys().await? {
            let Some(raw) = self.durable.get(&storage_key).await? else {
                continue;
            };
            let written_at = CacheEntry::decode(&raw).map(|e| e.written_at).unwrap_or(DateTime::<Utc>::MIN_UTC);
            aged.push((written_at, storage_key));
        }

        if aged.is_empty() {
            return Ok(0);
        }

        aged.sort();
        let count = eviction_count(aged.len(), self.config.eviction_percent);
        for (_, storage_key) in aged.into_iter().take(count) {
            self.durable.remove(&storage_key).await?;
        }

        Counters::add(&self.counters.evictions, count);
        tracing::info!(evicted = count, "evicted oldest durable entries");
        Ok(count)
    }
}

/// Number of entries to evict: `percent` of `total`, rounded up, at least one.
fn eviction_count(total: usize, percent: u8) -> usize {
    (total * usize::from(percent.clamp(1, 100))).div_ceil(100).clamp(1, total.max(1))
}
