//! cache_invalidate tool implementation.
//!
//! Drops cached pages by key, by collection, or all at once.

use qcache_core::QueryCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ToolError, json_result};

/// Parameters for the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// Cache key from collection_fetch, or "*" for everything.
    #[serde(default)]
    pub key: Option<String>,

    /// Drop every cached page of this collection.
    #[serde(default)]
    pub collection: Option<String>,
}

/// Output from the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInvalidateOutput {
    /// "key", "all" or "collection".
    pub scope: String,
    /// Entries removed, when the scope can count them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(cache: &QueryCache, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    let output = match (params.key, params.collection) {
        (Some(key), None) => {
            cache.invalidate(&key).await?;
            let scope = if key == "*" { "all" } else { "key" };
            CacheInvalidateOutput { scope: scope.to_string(), removed: None }
        }
        (None, Some(collection)) => {
            let removed = cache.invalidate_collection(&collection).await?;
            CacheInvalidateOutput { scope: "collection".to_string(), removed: Some(removed) }
        }
        _ => {
            return Err(ToolError::InvalidInput("exactly one of key or collection must be specified".into()).into());
        }
    };

    tracing::info!(scope = %output.scope, removed = ?output.removed, "cache invalidated");
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fetch::{CollectionFetchOutput, CollectionFetchParams, fetch_impl};
    use crate::tools::testing::{cache, calls, output};
    use serde_json::json;

    fn fetch_params(page_size: usize) -> CollectionFetchParams {
        serde_json::from_value(json!({ "collection": "fines", "page_size": page_size })).unwrap()
    }

    #[tokio::test]
    async fn test_invalidate_by_key() {
        let (cache, source) = cache();
        let fetched: CollectionFetchOutput = output(&fetch_impl(&cache, fetch_params(2)).await.unwrap());

        let params = CacheInvalidateParams { key: fetched.cache_key, collection: None };
        let out: CacheInvalidateOutput = output(&invalidate_impl(&cache, params).await.unwrap());
        assert_eq!(out.scope, "key");

        fetch_impl(&cache, fetch_params(2)).await.unwrap();
        assert_eq!(calls(&source), 2);
    }

    #[tokio::test]
    async fn test_invalidate_collection() {
        let (cache, _) = cache();
        fetch_impl(&cache, fetch_params(2)).await.unwrap();
        fetch_impl(&cache, fetch_params(3)).await.unwrap();

        let params = CacheInvalidateParams { key: None, collection: Some("fines".into()) };
        let out: CacheInvalidateOutput = output(&invalidate_impl(&cache, params).await.unwrap());
        assert_eq!(out.scope, "collection");
        assert_eq!(out.removed, Some(2));
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (cache, _) = cache();
        fetch_impl(&cache, fetch_params(2)).await.unwrap();

        let params = CacheInvalidateParams { key: Some("*".into()), collection: None };
        let out: CacheInvalidateOutput = output(&invalidate_impl(&cache, params).await.unwrap());
        assert_eq!(out.scope, "all");
        assert_eq!(cache.stats().await.unwrap().memory_entry_count, 0);
    }

    #[tokio::test]
    async fn test_invalidate_requires_one_target() {
        let (cache, _) = cache();

        let neither = CacheInvalidateParams { key: None, collection: None };
        assert_eq!(invalidate_impl(&cache, neither).await.unwrap_err().code.0, -32602);

        let both = CacheInvalidateParams { key: Some("*".into()), collection: Some("fines".into()) };
        assert!(invalidate_impl(&cache, both).await.is_err());
    }
}
