//! Cache management MCP tools.

pub mod invalidate;
pub mod stats;

pub use invalidate::{CacheInvalidateParams, invalidate_impl};
pub use stats::stats_impl;
