//! cache_stats tool implementation.

use qcache_core::{CacheStats, QueryCache};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};

use crate::error::json_result;

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsOutput {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(cache: &QueryCache) -> Result<CallToolResult, McpError> {
    let stats = cache.stats().await?;
    let hit_rate = stats.hit_rate();
    json_result(&CacheStatsOutput { stats, hit_rate })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fetch::{CollectionFetchParams, fetch_impl};
    use crate::tools::testing::{cache, output};
    use serde_json::json;

    #[tokio::test]
    async fn test_stats_after_miss_and_hit() {
        let (cache, _) = cache();
        let params: CollectionFetchParams = serde_json::from_value(json!({ "collection": "fines" })).unwrap();
        fetch_impl(&cache, params.clone()).await.unwrap();
        fetch_impl(&cache, params).await.unwrap();

        let out: CacheStatsOutput = output(&stats_impl(&cache).await.unwrap());
        assert_eq!(out.stats.memory_entry_count, 1);
        assert_eq!(out.stats.durable_entry_count, 1);
        assert_eq!(out.stats.misses, 1);
        assert_eq!(out.stats.memory_hits, 1);
        assert!((out.hit_rate - 0.5).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_stats_empty_cache() {
        let (cache, _) = cache();
        let out: CacheStatsOutput = output(&stats_impl(&cache).await.unwrap());
        assert_eq!(out.stats, CacheStats::default());
        assert_eq!(out.hit_rate, 0.0);
    }
}
