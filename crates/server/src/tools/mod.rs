//! MCP tool implementations.
//!
//! This module contains all tools exposed by the qcache server.

pub mod cache;
pub mod fetch;
