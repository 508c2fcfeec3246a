//! collection_fetch tool implementation.
//!
//! Reads one page of a collection through the query cache.

use qcache_core::{CachePolicy, Cursor, Direction, Filter, QueryCache, QueryOptions, Record};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ToolError, json_result};

/// A single filter as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FilterParam {
    /// Field path, e.g. "status" or "address.city".
    pub field: String,

    /// Operator: ==, !=, <, <=, >, >=, in, not-in, array-contains, array-contains-any.
    pub op: String,

    /// Comparison value. Arrays for in, not-in and array-contains-any.
    pub value: serde_json::Value,
}

/// Input parameters for collection_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CollectionFetchParams {
    /// Collection path, e.g. "fines" or "users/alice/complaints".
    pub collection: String,

    /// Items per page (clamped to 1-100, default 20).
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Cursor from a previous page. Cursor reads are never cached.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Field to order by (default "createdAt").
    #[serde(default)]
    pub order_field: Option<String>,

    /// "asc" or "desc" (default "desc").
    #[serde(default)]
    pub direction: Option<String>,

    /// Filters, applied in order.
    #[serde(default)]
    pub filters: Vec<FilterParam>,

    /// Read and write the cache (default true).
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Skip the cache lookup but store the fresh page.
    #[serde(default)]
    pub force_refresh: bool,

    /// Validity window in seconds for a newly cached page (default from config).
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

/// Output from the collection_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFetchOutput {
    pub items: Vec<Record>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub requested_count: usize,
    /// Key the page is cached under, for targeted invalidation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}

impl CollectionFetchParams {
    /// Build engine options and the per-call policy.
    fn into_query(self, cache: &QueryCache) -> Result<(String, QueryOptions, CachePolicy), McpError> {
        let mut options = QueryOptions::new().with_cursor(self.cursor.map(Cursor::new));
        if let Some(page_size) = self.page_size {
            options = options.with_page_size(page_size);
        }
        if self.order_field.is_some() || self.direction.is_some() {
            let direction = match self.direction.as_deref() {
                Some(d) => d.parse::<Direction>()?,
                None => options.order_by.direction,
            };
            let field = self.order_field.unwrap_or_else(|| options.order_by.field.clone());
            options = options.with_order(field, direction);
        }
        for filter in self.filters {
            options = options.with_filter(Filter::parse(filter.field, &filter.op, filter.value)?);
        }

        let ttl = match self.ttl_secs {
            Some(0) => return Err(ToolError::InvalidInput("ttl_secs must be at least 1".into()).into()),
            Some(secs) => Duration::from_secs(secs),
            None => cache.config().default_ttl,
        };
        let policy = CachePolicy { use_cache: self.use_cache, ttl, force_refresh: self.force_refresh };

        Ok((self.collection, options, policy))
    }
}

/// Implementation of the collection_fetch tool.
pub async fn fetch_impl(cache: &QueryCache, params: CollectionFetchParams) -> Result<CallToolResult, McpError> {
    let (collection, options, policy) = params.into_query(cache)?;

    let page = cache.fetch_paginated(&collection, &options, &policy).await?;

    let cache_key = (policy.use_cache && options.cursor.is_none()).then(|| cache.cache_key(&collection, &options));
    let output = CollectionFetchOutput {
        items: page.items,
        cursor: page.cursor.map(|c| c.as_str().to_string()),
        has_more: page.has_more,
        requested_count: page.requested_count,
        cache_key,
    };

    json_result(&output)
}
