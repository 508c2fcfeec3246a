//! Dual-tier query cache for paginated collection reads.
//!
//! This module provides the `QueryCache` engine and the durable tiers it can
//! persist to. It supports:
//!
//! - Content-addressed cache keys using SHA-256 hashing
//! - A memory tier backed by a durable key-value tier (SQLite or in-process)
//! - TTL validity checked at every lookup, plus a background expiry sweep
//! - Oldest-first eviction when the durable tier runs out of space

pub mod connection;
pub mod entries;
pub mod entry;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod query;
pub mod stats;
pub mod store;
pub mod sweep;

pub use crate::Error;

pub use connection::CacheDb;
pub use entry::CacheEntry;
pub use memory::MemoryStore;
pub use query::{CachePolicy, QueryCache, QueryCacheConfig};
pub use stats::CacheStats;
pub use store::DurableStore;
pub use sweep::ExpirySweep;
