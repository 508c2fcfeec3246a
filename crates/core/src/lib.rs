//! Core types and shared functionality for qcache.
//!
//! This crate provides:
//! - The `QueryCache` engine (memory tier + durable tier, TTL, bounded pages)
//! - Durable store implementations (SQLite and in-memory)
//! - Query, page and data source types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod query;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{
    CacheDb, CacheEntry, CachePolicy, CacheStats, DurableStore, ExpirySweep, MemoryStore, QueryCache,
    QueryCacheConfig,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use query::{
    Cursor, Direction, Document, Filter, FilterOp, MAX_PAGE_SIZE, OrderBy, Page, QueryOptions, Record, clamp_read,
};
pub use source::{DataSource, DataSourceError, PageRequest};
