//! A single cached page and its validity window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Error;
use crate::clock::age;
use crate::query::Page;

/// A cached first page.
///
/// Valid while `now - written_at < ttl`. A stale entry may still occupy
/// storage until it is swept or looked up, but it is never served.
///
/// `ttl_ms` is rounded up, so a sub-millisecond TTL still yields a
/// one-millisecond window instead of an entry that is born stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub collection_path: String,
    pub payload: Page,
    pub written_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>, collection_path: impl Into<String>, payload: Page, written_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.into(),
            collection_path: collection_path.into(),
            payload,
            written_at,
            ttl_ms: u64::try_from(ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_fresh_for(now, self.ttl())
    }

    /// Valid under the entry's own TTL and no older than `max_age`.
    pub fn is_fresh_for(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let age = age(now, self.written_at).to_std().unwrap_or(Duration::ZERO);
        age < self.ttl().min(max_age)
    }

    /// Serialize for the durable tier.
    pub fn encode(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a value read back from the durable tier.
    pub fn decode(raw: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(raw)?)
    }
}
